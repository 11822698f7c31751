//! Status command implementation
//!
//! Prints the current `cub` context and checks that its credentials are
//! accepted by the server.

use anyhow::Result;

use cub_compose::client::ConfigHubClient;
use cub_compose::context::ContextLoader;
use cub_compose::reconcile::Reconciler;
use cub_compose::suggestions;

use crate::cli::GlobalArgs;

/// Execute the status command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let confighub_dir = global.confighub_dir();
    let loader = ContextLoader::new(&confighub_dir);
    let info = loader
        .load_info()
        .map_err(|e| suggestions::from_error(e, &confighub_dir))?;

    println!("Context:      {}", info.context_name);
    println!("Server:       {}", info.server_url);
    println!("Organization: {}", info.organization_name);
    println!("User:         {}", info.user);

    let probed = loader
        .load_credentials()
        .and_then(|credentials| ConfigHubClient::from_credentials(&credentials))
        .and_then(|client| Reconciler::new(&client).probe());

    match probed {
        Ok(()) => {
            println!("Auth:         OK");
            Ok(())
        }
        Err(e) => {
            println!("Auth:         FAILED");
            Err(suggestions::from_error(e, &confighub_dir))
        }
    }
}
