use std::path::PathBuf;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use serde_json::{json, Value};
use tracing::{error, info};

use promptverse::config::CONFIG;
use promptverse::credentials::{CredentialStore, LocalStore};
use promptverse::llm::media::{decode_data_uri, encode_data_uri};
use promptverse::llm::{AiGateway, AnalysisBucket, GatewayError, GatewaySettings, GeminiClient};
use promptverse::state::{AppState, GenerationDraft};
use promptverse::utils::http::get_http_client;
use promptverse::utils::logging::{
    init_logging, read_recent_log_lines, GENERAL_LOG_NAME, TIMING_LOG_NAME,
};
use promptverse::utils::timing::{complete_command_timer, start_command_timer};

type Gateway = AiGateway<GeminiClient>;

const DEFAULT_LOG_LINES: usize = 50;

fn usage() -> &'static str {
    "Usage: promptverse <command>\n\
     \n\
     Commands:\n\
     \x20 enhance --idea <text> [--style <style>]\n\
     \x20 image --prompt <text> [--aspect-ratio <ratio>] [--out <file>]\n\
     \x20 reverse --file <image>\n\
     \x20 decompose --text <prompt> [--merge [--into <bucket>=<category>]...]\n\
     \x20 create --idea <text> [--style <style>] [--aspect-ratio <ratio>]\n\
     \x20 gallery [--query <text>] [--category <id>]\n\
     \x20 key set <value> | key clear | key status\n\
     \x20 logs [--timing] [--lines <n>]"
}

#[derive(Debug, PartialEq)]
enum KeyAction {
    Set(String),
    Clear,
    Status,
}

#[derive(Debug, PartialEq)]
enum Command {
    Enhance {
        idea: String,
        style: String,
    },
    Image {
        prompt: String,
        aspect_ratio: String,
        out: Option<PathBuf>,
    },
    Reverse {
        file: PathBuf,
    },
    Decompose {
        text: String,
        merge: bool,
        targets: Vec<(AnalysisBucket, String)>,
    },
    Create {
        idea: String,
        style: Option<String>,
        aspect_ratio: Option<String>,
    },
    Gallery {
        query: String,
        category: String,
    },
    Key(KeyAction),
    Logs {
        timing: bool,
        lines: usize,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Enhance { .. } => "enhance",
            Command::Image { .. } => "image",
            Command::Reverse { .. } => "reverse",
            Command::Decompose { .. } => "decompose",
            Command::Create { .. } => "create",
            Command::Gallery { .. } => "gallery",
            Command::Key(_) => "key",
            Command::Logs { .. } => "logs",
        }
    }

    fn needs_gateway(&self) -> bool {
        matches!(
            self,
            Command::Enhance { .. }
                | Command::Image { .. }
                | Command::Reverse { .. }
                | Command::Decompose { .. }
                | Command::Create { .. }
        )
    }
}

/// Flag values collected from `args[2..]`.
#[derive(Default)]
struct Flags {
    values: Vec<(String, String)>,
    switches: Vec<String>,
    positional: Vec<String>,
}

impl Flags {
    fn get(&self, flag: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| value.as_str())
    }

    fn require(&self, flag: &str) -> anyhow::Result<String> {
        self.get(flag)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{flag} is required\n{}", usage()))
    }

    fn get_all<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |(name, _)| name == flag)
            .map(|(_, value)| value.as_str())
    }

    fn has(&self, switch: &str) -> bool {
        self.switches.iter().any(|name| name == switch)
    }
}

fn parse_flags(args: &[String], switches: &[&str], valued: &[&str]) -> anyhow::Result<Flags> {
    let mut flags = Flags::default();
    let mut index = 0;
    while index < args.len() {
        let arg = args[index].as_str();
        if switches.contains(&arg) {
            flags.switches.push(arg.to_string());
        } else if valued.contains(&arg) {
            index += 1;
            let value = args
                .get(index)
                .ok_or_else(|| anyhow!("Missing value for {arg}"))?;
            flags.values.push((arg.to_string(), value.clone()));
        } else if arg == "--help" || arg == "-h" {
            return Err(anyhow!(usage()));
        } else if arg.starts_with("--") {
            return Err(anyhow!("Unknown argument: {arg}\n{}", usage()));
        } else {
            flags.positional.push(arg.to_string());
        }
        index += 1;
    }
    Ok(flags)
}

/// `<bucket>=<category-id>`, e.g. `artists=aesthetics`.
fn parse_bucket_target(value: &str) -> anyhow::Result<(AnalysisBucket, String)> {
    let (bucket, category) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --into value: {value} (expected <bucket>=<category>)"))?;
    let bucket = AnalysisBucket::from_key(bucket.trim())
        .ok_or_else(|| anyhow!("Unknown analysis bucket in --into: {}", bucket.trim()))?;
    let category = category.trim();
    if category.is_empty() {
        return Err(anyhow!("Missing category in --into value: {value}"));
    }
    Ok((bucket, category.to_string()))
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let name = args.get(1).map(String::as_str).unwrap_or_default();
    let rest = args.get(2..).unwrap_or_default();

    let command = match name {
        "enhance" => {
            let flags = parse_flags(rest, &[], &["--idea", "--style"])?;
            Command::Enhance {
                idea: flags.require("--idea")?,
                style: flags.get("--style").unwrap_or_default().to_string(),
            }
        }
        "image" => {
            let flags = parse_flags(rest, &[], &["--prompt", "--aspect-ratio", "--out"])?;
            Command::Image {
                prompt: flags.require("--prompt")?,
                aspect_ratio: flags.get("--aspect-ratio").unwrap_or("1:1").to_string(),
                out: flags.get("--out").map(PathBuf::from),
            }
        }
        "reverse" => {
            let flags = parse_flags(rest, &[], &["--file"])?;
            Command::Reverse {
                file: PathBuf::from(flags.require("--file")?),
            }
        }
        "decompose" => {
            let flags = parse_flags(rest, &["--merge"], &["--text", "--into"])?;
            let merge = flags.has("--merge");
            let targets = flags
                .get_all("--into")
                .map(parse_bucket_target)
                .collect::<anyhow::Result<Vec<_>>>()?;
            if !targets.is_empty() && !merge {
                return Err(anyhow!("--into only applies together with --merge"));
            }
            Command::Decompose {
                text: flags.require("--text")?,
                merge,
                targets,
            }
        }
        "create" => {
            let flags = parse_flags(rest, &[], &["--idea", "--style", "--aspect-ratio"])?;
            Command::Create {
                idea: flags.require("--idea")?,
                style: flags.get("--style").map(str::to_string),
                aspect_ratio: flags.get("--aspect-ratio").map(str::to_string),
            }
        }
        "gallery" => {
            let flags = parse_flags(rest, &[], &["--query", "--category"])?;
            Command::Gallery {
                query: flags.get("--query").unwrap_or_default().to_string(),
                category: flags.get("--category").unwrap_or("all").to_string(),
            }
        }
        "key" => {
            let flags = parse_flags(rest, &[], &[])?;
            let action = match flags.positional.as_slice() {
                [action, value] if action == "set" => KeyAction::Set(value.clone()),
                [action] if action == "clear" => KeyAction::Clear,
                [action] if action == "status" => KeyAction::Status,
                _ => return Err(anyhow!("Usage: promptverse key set <value>|clear|status")),
            };
            Command::Key(action)
        }
        "logs" => {
            let flags = parse_flags(rest, &["--timing"], &["--lines"])?;
            let lines = match flags.get("--lines") {
                Some(value) => value
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid --lines value: {value}"))?,
                None => DEFAULT_LOG_LINES,
            };
            Command::Logs {
                timing: flags.has("--timing"),
                lines,
            }
        }
        "" => return Err(anyhow!(usage())),
        other => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    };
    Ok(command)
}

fn credential_store() -> CredentialStore {
    CredentialStore::new(LocalStore::new(CONFIG.local_store_path.clone()))
}

fn build_gateway(store: &CredentialStore) -> Gateway {
    let resolved = store.resolve(Some(CONFIG.gemini_api_key.as_str()));
    match &resolved {
        Some(resolved) => info!(
            "Using Gemini API key {} from {}",
            resolved.credential.hint(),
            resolved.source.label()
        ),
        None => info!("No Gemini API key configured"),
    }
    let transport = GeminiClient::new(get_http_client().clone(), &CONFIG.gemini_api_base);
    AiGateway::new(
        transport,
        resolved.map(|resolved| resolved.credential),
        GatewaySettings::from_config(&CONFIG),
    )
}

async fn run_command(
    command: Command,
    gateway: Option<&Gateway>,
    state: &AppState,
    store: &CredentialStore,
) -> anyhow::Result<Value> {
    let gateway = || gateway.ok_or(GatewayError::MissingCredential);

    match command {
        Command::Enhance { idea, style } => {
            let enhanced = gateway()?.enhance_and_translate(&idea, &style).await?;
            Ok(serde_json::to_value(enhanced)?)
        }
        Command::Image {
            prompt,
            aspect_ratio,
            out,
        } => {
            let data_uri = gateway()?.generate_image(&prompt, &aspect_ratio).await?;
            let Some(out) = out else {
                return Ok(json!({ "imageDataUri": data_uri }));
            };
            let bytes = decode_data_uri(&data_uri)
                .ok_or_else(|| anyhow!("Provider returned an undecodable image"))?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            Ok(json!({ "path": out.display().to_string(), "bytes": bytes.len() }))
        }
        Command::Reverse { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let description = gateway()?
                .reverse_describe_image(&encode_data_uri(&bytes))
                .await?;
            Ok(serde_json::to_value(description)?)
        }
        Command::Decompose {
            text,
            merge,
            targets,
        } => {
            let analysis = gateway()?.decompose_prompt(&text).await?;
            if !merge {
                return Ok(serde_json::to_value(analysis)?);
            }
            let filed = state
                .merge_analysis(&analysis, &targets)?
                .into_iter()
                .map(|filed| {
                    json!({
                        "bucket": filed.bucket.key(),
                        "categoryId": filed.category_id,
                        "chosenByCaller": filed.chosen_by_caller,
                        "modifier": filed.modifier,
                    })
                })
                .collect::<Vec<_>>();
            let categories = state.taxonomy.lock().snapshot();
            Ok(json!({
                "analysis": analysis,
                "filed": filed,
                "taxonomy": categories.as_slice(),
            }))
        }
        Command::Create {
            idea,
            style,
            aspect_ratio,
        } => {
            let gateway = gateway()?;
            let style = style.unwrap_or_else(|| state.styles.lock().default_value().to_string());
            let aspect_ratio =
                aspect_ratio.unwrap_or_else(|| state.ratios.lock().default_value().to_string());

            let enhanced = gateway.enhance_and_translate(&idea, &style).await?;
            let image_url = gateway
                .generate_image(&enhanced.english_prompt, &aspect_ratio)
                .await?;
            let record = state.create_from_generation(GenerationDraft {
                idea,
                style,
                aspect_ratio,
                enhanced: Some(enhanced),
                image_url,
                model_used: gateway.settings().image_model.clone(),
            })?;
            Ok(serde_json::to_value(record)?)
        }
        Command::Gallery { query, category } => {
            let records = state.filtered_prompts(&query, &category);
            Ok(json!({ "count": records.len(), "prompts": records }))
        }
        Command::Key(KeyAction::Set(value)) => {
            let credential = store.save(&value)?;
            Ok(json!({ "stored": true, "key": credential.hint() }))
        }
        Command::Key(KeyAction::Clear) => {
            let removed = store.clear()?;
            Ok(json!({ "cleared": removed }))
        }
        Command::Key(KeyAction::Status) => {
            let resolved = store.resolve(Some(CONFIG.gemini_api_key.as_str()));
            Ok(match resolved {
                Some(resolved) => json!({
                    "configured": true,
                    "source": resolved.source.label(),
                    "key": resolved.credential.hint(),
                }),
                None => json!({ "configured": false }),
            })
        }
        Command::Logs { timing, lines } => {
            let base_name = if timing { TIMING_LOG_NAME } else { GENERAL_LOG_NAME };
            let tail = read_recent_log_lines(&CONFIG.logs_dir, base_name, lines)?;
            Ok(match tail {
                Some(tail) => json!({
                    "path": tail.path.display().to_string(),
                    "lines": tail.lines,
                }),
                None => json!({ "path": null, "lines": [] }),
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging(&CONFIG);

    let args: Vec<String> = std::env::args().collect();
    let command = parse_command(&args)?;
    let mut timer = start_command_timer(command.name(), args.get(2..).unwrap_or_default());

    let store = credential_store();
    let gateway = command.needs_gateway().then(|| build_gateway(&store));
    let state = AppState::seeded()?;

    match run_command(command, gateway.as_ref(), &state, &store).await {
        Ok(output) => {
            complete_command_timer(&mut timer, "success", None);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            let auth_related = err
                .downcast_ref::<GatewayError>()
                .is_some_and(GatewayError::is_auth_related);
            complete_command_timer(&mut timer, "error", Some(err.to_string()));
            error!("Command failed: {err:#}");
            if auth_related {
                eprintln!(
                    "Set GEMINI_API_KEY or run `promptverse key set <key>` to configure the API key."
                );
            }
            Err(err)
        }
    }
}
