use anyhow::Result;

use crate::cli::QueryArgs;
use crate::config::Config;
use crate::utils::output::OutputStyle;

/// Run one query and print its line. Returns `false` when the query
/// produced a failure line or the usage hint.
pub fn handle_query_command(config: Config, args: &QueryArgs) -> Result<bool> {
    let dispatcher = crate::dispatcher_from_config(&config);

    let response = dispatcher.dispatch(&args.line());
    println!("{}", OutputStyle::response(&response, config.general.color));
    Ok(!response.is_failure())
}
