//! Built-in content a fresh session starts from.

use chrono::{Duration, Utc};

use crate::collection::filters::{ALL_CATEGORY, FAVORITES_CATEGORY};
use crate::collection::{FilterCategory, GalleryFilters, PromptRecord};
use crate::llm::FALLBACK_ASPECT_RATIO;
use crate::options::{ChoiceOption, OptionList};
use crate::taxonomy::{Category, ModifierEntry};

const DEFAULT_STYLES: [&str; 8] = [
    "Photorealistic",
    "Anime",
    "Cyberpunk",
    "Oil Painting",
    "3D Render",
    "Vector Art",
    "Watercolor",
    "Sketch",
];

const DEFAULT_RATIOS: [(&str, &str); 5] = [
    ("1:1", "Square (1:1)"),
    ("16:9", "Landscape (16:9)"),
    ("9:16", "Portrait (9:16)"),
    ("3:4", "Portrait (3:4)"),
    ("4:3", "Landscape (4:3)"),
];

const GALLERY_FILTERS: [(&str, &str, &str); 8] = [
    (ALL_CATEGORY, "All", "全部"),
    (FAVORITES_CATEGORY, "Favorites", "收藏"),
    ("photorealistic", "Photorealistic", "真实感"),
    ("anime", "Anime & Manga", "动漫 & 漫画"),
    ("cyberpunk", "Cyberpunk", "赛博朋克"),
    ("fantasy", "Fantasy Art", "奇幻艺术"),
    ("3d", "3D Render", "3D 渲染"),
    ("abstract", "Abstract", "抽象派"),
];

type SeedCategory = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const TAXONOMY: [SeedCategory; 4] = [
    (
        "aesthetics",
        "🎨 美学风格 (Aesthetics)",
        &[
            ("赛博朋克", "Cyberpunk"),
            ("蒸汽朋克", "Steampunk"),
            ("极简主义", "Minimalist"),
            ("像素艺术", "Pixel Art"),
            ("浮世绘", "Ukiyo-e"),
            ("吉卜力风格", "Studio Ghibli Style"),
        ],
    ),
    (
        "lighting",
        "💡 灯光与氛围 (Lighting)",
        &[
            ("电影光效", "Cinematic Lighting"),
            ("体积光/丁达尔效应", "Volumetric Lighting"),
            ("生物发光", "Bioluminescent"),
            ("黄金时刻", "Golden Hour"),
            ("赛博霓虹", "Neon Lights"),
        ],
    ),
    (
        "camera",
        "📷 相机与镜头 (Camera)",
        &[
            ("广角镜头", "Wide Angle"),
            ("微距摄影", "Macro Photography"),
            ("鱼眼镜头", "Fisheye Lens"),
            ("景深/背景虚化", "Depth of Field"),
            ("航拍视角", "Aerial View"),
        ],
    ),
    (
        "composition",
        "📐 构图 (Composition)",
        &[
            ("对称构图", "Symmetrical"),
            ("极简构图", "Minimalist Composition"),
            ("引导线", "Leading Lines"),
            ("中心构图", "Centered"),
        ],
    ),
];

pub fn default_styles() -> OptionList {
    OptionList::new(
        DEFAULT_STYLES.iter().map(|style| ChoiceOption::plain(style)).collect(),
        "",
    )
}

pub fn default_ratios() -> OptionList {
    OptionList::new(
        DEFAULT_RATIOS
            .iter()
            .map(|(value, label)| ChoiceOption::labelled(value, label))
            .collect(),
        FALLBACK_ASPECT_RATIO,
    )
}

pub fn gallery_filters() -> GalleryFilters {
    GalleryFilters::new(
        GALLERY_FILTERS
            .iter()
            .map(|(id, label, label_zh)| FilterCategory::new(id, label, label_zh))
            .collect(),
    )
}

/// Modifier ids are positional within each category ("1", "2", ...).
pub fn taxonomy() -> Vec<Category> {
    TAXONOMY
        .iter()
        .map(|(id, name, modifiers)| Category {
            id: id.to_string(),
            name: name.to_string(),
            modifiers: modifiers
                .iter()
                .enumerate()
                .map(|(index, (zh, en))| ModifierEntry {
                    id: (index + 1).to_string(),
                    zh: zh.to_string(),
                    en: en.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Sample gallery, newest first.
pub fn sample_prompts() -> Vec<PromptRecord> {
    let now = Utc::now();
    let mut samurai = PromptRecord::new(
        "霓虹赛博武士",
        "A futuristic samurai standing in a rainy cyberpunk city, neon lights reflecting off wet pavement, detailed armor with glowing circuitry, cinematic lighting, 8k resolution, unreal engine 5 render, highly detailed, sharp focus.",
        "https://picsum.photos/seed/cyberpunk/800/800",
        "NeoArtist",
    )
    .with_translation("一位未来的武士站在多雨的赛博朋克城市中，霓虹灯在湿润的路面上反射，精细的盔甲带有发光的电路，电影级照明，8k分辨率，虚幻引擎5渲染，高度细节，清晰对焦。")
    .with_tags(["cyberpunk", "scifi", "character", "neon"]);
    samurai.id = "1".into();
    samurai.likes = 124;
    samurai.created_at = now;

    let mut spirit = PromptRecord::new(
        "空灵森林之灵",
        "A mystical forest spirit made of glowing light and leaves, deep ancient forest background, bioluminescent plants, magical atmosphere, soft ethereal glow, intricate details, fantasy art style, masterpiece.",
        "https://picsum.photos/seed/forest/800/1200",
        "NatureLover",
    )
    .with_translation("由发光的光芒和树叶组成的神秘森林之灵，深邃的古老森林背景，生物发光植物，魔法氛围，柔和的空灵光芒，错综复杂的细节，奇幻艺术风格，杰作。")
    .with_tags(["fantasy", "nature", "magic", "ethereal"]);
    spirit.id = "2".into();
    spirit.likes = 89;
    spirit.created_at = now - Duration::seconds(100);

    let mut room = PromptRecord::new(
        "复古等轴测房间",
        "Isometric view of a cozy retro gamer room, 90s aesthetic, crt tv, game consoles, messy but cozy, warm lighting, lo-fi vibe, voxel art style, 3d render, blender.",
        "https://picsum.photos/seed/room/1200/800",
        "VoxelMaster",
    )
    .with_translation("舒适的复古游戏玩家房间的等轴测视图，90年代美学，CRT电视，游戏机，凌乱但舒适，温暖的灯光，低保真氛围，体素艺术风格，3D渲染，Blender。")
    .with_tags(["3d", "isometric", "retro", "interior"]);
    room.id = "3".into();
    room.likes = 256;
    room.created_at = now - Duration::seconds(200);

    vec![samurai, spirit, room]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::PromptCollection;
    use crate::taxonomy::TaxonomyStore;

    #[test]
    fn seeds_are_internally_consistent() {
        let store = TaxonomyStore::new(taxonomy()).expect("unique category ids");
        assert_eq!(store.len(), 4);
        assert_eq!(store.get("lighting").map(|c| c.modifiers.len()), Some(5));

        let collection = PromptCollection::new(sample_prompts()).expect("unique record ids");
        assert_eq!(collection.len(), 3);
        assert!(collection
            .records()
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn option_defaults() {
        assert_eq!(default_styles().default_value(), "Photorealistic");
        assert_eq!(default_ratios().options().len(), 5);
        assert_eq!(default_ratios().default_value(), "1:1");
        let filters = gallery_filters();
        assert_eq!(filters.entries().len(), 8);
        assert!(filters.entries()[0].is_protected());
    }
}
