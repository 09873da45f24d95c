use anyhow::Result;
use tracing::{debug, info};

use crate::commands;
use crate::platform::{Responder, Update};

/// Handle one webhook update: route its text and send at most one reply.
///
/// Returns the platform's response to the reply, or `None` when the update
/// needed no answer.
pub async fn process_update(
    update: Update,
    responder: &dyn Responder,
) -> Result<Option<serde_json::Value>> {
    let update_id = update.update_id;
    let Some(msg) = update.into_message() else {
        debug!("Ignoring update {:?} without a message", update_id);
        return Ok(None);
    };

    let text = msg.text.as_deref().unwrap_or("");
    info!("Message from chat {:?}: {}", msg.chat.id, text);

    let Some(mut reply) = commands::route(text) else {
        debug!("No reply for update {:?}", update_id);
        return Ok(None);
    };

    // Answer inside the same forum topic
    if reply.options.message_thread_id.is_none() {
        reply.options.message_thread_id = msg.message_thread_id;
    }

    let response = responder
        .send_message(&msg.chat.id, &reply.text, &reply.options)
        .await?;
    Ok(Some(response))
}
