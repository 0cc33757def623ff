#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("category '{0}' not found")]
    CategoryNotFound(String),

    #[error("modifier '{modifier_id}' not found in category '{category_id}'")]
    ModifierNotFound {
        category_id: String,
        modifier_id: String,
    },

    #[error("prompt record '{0}' not found")]
    RecordNotFound(String),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("{0} must not be empty")]
    BlankField(&'static str),

    #[error("no category available to file the item into")]
    NoTargetCategory,

    #[error("category '{0}' is built in and cannot be removed")]
    ProtectedCategory(String),

    #[error("option '{0}' not found")]
    OptionNotFound(String),
}
