use stride_protocol::{Command, CommandPayload, Domain, ResponseData};
use tracing::info;

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};

use super::{SUBSCRIPTION_TARGET, Subscription};

/// Handles the `Sub*Value` command of one domain.
///
/// A non-empty variable list creates a subscription and answers with its
/// first snapshot. An empty list flags the matching subscriptions, which are
/// removed at the next step boundary.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeHandler {
    domain: Domain,
}

impl SubscribeHandler {
    #[must_use]
    pub const fn new(domain: Domain) -> Self {
        Self { domain }
    }
}

impl CommandHandler for SubscribeHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        context.session().require_scenario()?;
        let variables = match command.payload() {
            Some(CommandPayload::Variables(variables)) => variables,
            Some(_) => {
                return Err(HandlerError::UnexpectedPayload {
                    operation: "subscribe",
                });
            }
            None => {
                return Err(HandlerError::MissingPayload {
                    operation: "subscribe",
                });
            }
        };
        let element_id = command.element_id().unwrap_or_default();

        if variables.is_empty() {
            let flagged = context
                .session_mut()
                .subscriptions_mut()
                .flag_matching(self.domain, element_id);
            return Ok(HandlerOutcome::ok().with_description(format!(
                "{flagged} subscription(s) flagged for removal"
            )));
        }

        let mut subscription = Subscription::new(
            self.domain,
            element_id,
            variables,
            command.protocol_version(),
        )?;
        let snapshot = context.evaluate(&mut subscription);
        if subscription.all_failed() {
            let message = snapshot
                .responses
                .first()
                .map_or_else(String::new, |response| response.description().to_owned());
            return Err(HandlerError::SubscriptionRejected { message });
        }

        let session = context.session_mut();
        info!(
            target: SUBSCRIPTION_TARGET,
            connection = %session.id(),
            domain = self.domain.as_str(),
            element_id,
            variables = ?subscription.variable_ids(),
            "subscription created"
        );
        session.subscriptions_mut().add(subscription);
        Ok(HandlerOutcome::data(ResponseData::Subscriptions {
            snapshots: vec![snapshot],
        }))
    }
}
