//! Who may see which asset
//!
//! | caller    | sees                                              |
//! |-----------|---------------------------------------------------|
//! | anonymous | nothing                                           |
//! | student   | assets they uploaded or are listed as a maker on  |
//! | teacher   | everything                                        |
//!
//! Name comparison is exact and case-sensitive. Makers are stored with the
//! resolved display name, so this matches the caller's credential name.

use crate::assets::{AssetMetadata, DecodedAsset};
use crate::auth::{Caller, Role};

/// Whether `caller` may see an asset carrying `metadata`
pub fn can_view(caller: Option<&Caller>, metadata: &AssetMetadata) -> bool {
    let Some(caller) = caller else {
        return false;
    };

    match caller.role {
        Role::Teacher => true,
        Role::Student => {
            metadata.uploader_name == caller.name
                || metadata.makers.iter().any(|m| *m == caller.name)
        }
    }
}

/// Keep only the assets `caller` may see, preserving order
pub fn filter_visible(assets: Vec<DecodedAsset>, caller: Option<&Caller>) -> Vec<DecodedAsset> {
    assets
        .into_iter()
        .filter(|asset| can_view(caller, &asset.metadata))
        .collect()
}
