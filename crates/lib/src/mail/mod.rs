//! Mail delivery capability.
//!
//! `EmailSender` is the seam the dispatcher sends through. Providers: Resend (HTTP API) and a
//! disabled sender that only logs, for local runs and dry runs.

mod disabled;
mod resend;
mod sender;

pub use disabled::DisabledSender;
pub use resend::ResendSender;
pub use sender::{EmailSender, MailError, OutboundEmail};

use crate::config::{self, Config, MailProvider};
use anyhow::Result;
use std::sync::Arc;

/// Build the configured sender. The Resend provider requires an API key (config or RESEND_API_KEY).
pub fn sender_from_config(config: &Config) -> Result<Arc<dyn EmailSender>> {
    match config.mail.provider {
        MailProvider::Disabled => {
            log::warn!("mail: provider is disabled, notifications will be logged and not delivered");
            Ok(Arc::new(DisabledSender::new()))
        }
        MailProvider::Resend => {
            let Some(api_key) = config::resolve_mail_api_key(config) else {
                anyhow::bail!(
                    "mail provider \"resend\" requires an API key (set mail.apiKey or RESEND_API_KEY)"
                );
            };
            Ok(Arc::new(ResendSender::new(
                api_key,
                config.mail.api_base.clone(),
            )))
        }
    }
}
