//! Executes one assistant turn's action requests
//!
//! Requests run strictly in order, one at a time. Failures never escape: they
//! become `Error: ...` text so the reasoning provider can pick another move.

use tracing::{info, warn};

use super::actions::ActionCatalog;
use super::conversation::{ActionRequest, Message};
use crate::session::ResearchSession;

/// Run `requests` against `catalog`, returning one tool result per known action.
///
/// Requests naming an action that is not in the catalog are skipped and
/// produce no result.
pub async fn dispatch(
    catalog: &ActionCatalog,
    session: &mut ResearchSession,
    requests: &[ActionRequest],
) -> Vec<Message> {
    let mut results = Vec::with_capacity(requests.len());

    for request in requests {
        let Some(action) = catalog.get(&request.name) else {
            warn!("Skipping unknown action '{}' ({})", request.name, request.id);
            continue;
        };

        info!("Action {} {}", request.name, request.arguments);
        let content = match action.invoke(session, request.arguments.clone()).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Action {} failed: {}", request.name, e);
                format!("Error: {}", e)
            }
        };

        results.push(Message::tool_result(request, content));
    }

    results
}
