//! User resource: entity implementation, errors, runtime context.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::UserClient;
use crate::config::{AppConfig, MailConfig};
use crate::mailer::{MailError, Mailer, TemplateRenderer};
use crate::model::User;
use resource_framework::{
    CacheStore, CollectionAccessor, NotificationEmitter, PipelineConfig, ResourceActor,
    SideEffectError,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Published as an `info` event once the reset mail is delivered.
pub const RESET_LINK_SENT: &str = "emailSentPasswordResetLink";
/// Published as an `error` event when the reset mail cannot be rendered.
pub const UNABLE_TO_RENDER_EMAIL: &str = "UnableToRenderEmail";
/// Published as an `error` event when the reset mail cannot be delivered.
pub const UNABLE_TO_SEND_EMAIL: &str = "UnableToSendEmail";

/// Runtime dependencies of the user hooks.
pub struct UserContext {
    renderer: Arc<dyn TemplateRenderer>,
    mailer: Arc<dyn Mailer>,
    app: AppConfig,
    mail: MailConfig,
}

impl UserContext {
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        mailer: Arc<dyn Mailer>,
        app: AppConfig,
        mail: MailConfig,
    ) -> Self {
        Self {
            renderer,
            mailer,
            app,
            mail,
        }
    }

    /// Renders and sends the password-reset mail for a freshly created user.
    pub(crate) async fn send_reset_link(
        &self,
        user: &User,
    ) -> Result<Option<String>, SideEffectError> {
        let Some(token) = user.reset_password_token.as_deref() else {
            return Ok(None);
        };
        let vars = json!({
            "name": user.full_name,
            "resetLink": format!("{}reset/{token}", self.app.url),
            "app": { "name": self.app.name, "url": self.app.url },
        });

        let html = self
            .bounded("render", self.renderer.render(&self.mail.reset_template, &vars))
            .await
            .map_err(|e| SideEffectError::new(UNABLE_TO_RENDER_EMAIL, e.to_string()))?;
        let receipt = self
            .bounded(
                "send",
                self.mailer.send(&user.email, &self.mail.reset_subject, &html),
            )
            .await
            .map_err(|e| SideEffectError::new(UNABLE_TO_SEND_EMAIL, e.to_string()))?;

        debug!(code = %user.code, message_id = %receipt.message_id, "Reset link sent");
        Ok(Some(RESET_LINK_SENT.to_string()))
    }

    async fn bounded<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<R, MailError>>,
    ) -> Result<R, MailError> {
        let budget = self.mail.timeout();
        tokio::time::timeout(budget, call)
            .await
            .unwrap_or(Err(MailError::Timeout {
                operation,
                elapsed: budget,
            }))
    }
}

/// Creates the user actor and its client.
pub fn new(
    collection: Arc<dyn CollectionAccessor<User>>,
    cache: Arc<dyn CacheStore>,
    emitter: Arc<dyn NotificationEmitter>,
    config: PipelineConfig,
) -> (ResourceActor<User>, UserClient) {
    let (actor, generic_client) = ResourceActor::new(collection, cache, emitter, config);
    (actor, UserClient::new(generic_client))
}
