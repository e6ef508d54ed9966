//! Environment source: SCRIVENER_<SECTION>__<KEY>, e.g. SCRIVENER_TEXT__MODEL.

use crate::config::ENV_PREFIX;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
