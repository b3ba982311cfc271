use tracing::info;

use crate::{
    dto::contact::ContactRequest, error::ServiceError, services::mailer::OutgoingMail,
    state::SharedState,
};

/// Forward a contact form message to the configured inbox.
pub async fn send_contact_message(
    state: &SharedState,
    request: ContactRequest,
) -> Result<(), ServiceError> {
    let name = request.name.trim();
    let mail = OutgoingMail {
        to: state.config().contact_inbox().to_string(),
        subject: format!("Contact form: {name}"),
        body: format!("From: {name} <{}>\n\n{}", request.email, request.message),
        reply_to: Some(request.email),
    };
    state.mailer().send(mail).await?;
    info!("contact message dispatched");
    Ok(())
}
