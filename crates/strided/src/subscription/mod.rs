//! Subscriptions: recurring Get queries answered at every step boundary.
//!
//! A subscription stores one Get template per requested variable and runs
//! them through the ordinary dispatcher, so a subscribed variable reports
//! exactly what a direct Get would. Subscriptions are removed only at step
//! boundaries, after they have been flagged.

mod handler;

use stride_protocol::{Command, Domain, Response, Status, SubscriptionSnapshot, TraciCommand};
use tracing::debug;

use crate::dispatch::{Dispatcher, HandlerError};
use crate::session::Session;

pub use self::handler::SubscribeHandler;

const SUBSCRIPTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::subscription");

/// One client subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    domain: Domain,
    response_command_id: u8,
    element_id: String,
    templates: Vec<Command>,
    latest: Option<SubscriptionSnapshot>,
    flagged: bool,
}

impl Subscription {
    /// Builds the Get templates for `variables` of `element_id`.
    ///
    /// An empty `element_id` addresses the domain as a whole.
    ///
    /// # Errors
    ///
    /// Fails for domains without Get or subscription response commands.
    pub fn new(
        domain: Domain,
        element_id: &str,
        variables: &[u8],
        protocol_version: u32,
    ) -> Result<Self, HandlerError> {
        let (Some(get), Some(response_command_id)) = (
            TraciCommand::get_for(domain),
            domain.subscription_response_id(),
        ) else {
            return Err(HandlerError::protocol(format!(
                "{} values cannot be subscribed",
                domain.as_str()
            )));
        };

        let templates = variables
            .iter()
            .map(|variable| {
                let template = Command::new(get.id())
                    .with_variable(*variable)
                    .with_protocol_version(protocol_version);
                if element_id.is_empty() {
                    template
                } else {
                    template.with_element(element_id)
                }
            })
            .collect();

        Ok(Self {
            domain,
            response_command_id,
            element_id: element_id.to_owned(),
            templates,
            latest: None,
            flagged: false,
        })
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Subscribed variable ids in request order.
    #[must_use]
    pub fn variable_ids(&self) -> Vec<u8> {
        self.templates
            .iter()
            .filter_map(Command::variable_id)
            .collect()
    }

    #[must_use]
    pub fn matches(&self, domain: Domain, element_id: &str) -> bool {
        self.domain == domain && self.element_id == element_id
    }

    /// Runs every template and stores the aggregated result.
    ///
    /// When every variable fails, the subscription flags itself for removal.
    pub fn evaluate(
        &mut self,
        dispatcher: &Dispatcher,
        session: &mut Session,
    ) -> &SubscriptionSnapshot {
        let responses: Vec<Response> = self
            .templates
            .iter()
            .map(|template| dispatcher.execute(template, session))
            .collect();
        if !responses.is_empty()
            && responses
                .iter()
                .all(|response| response.status() == Status::Err)
        {
            debug!(
                target: SUBSCRIPTION_TARGET,
                domain = self.domain.as_str(),
                element_id = %self.element_id,
                "every subscribed variable failed; flagging subscription"
            );
            self.flagged = true;
        }
        self.latest.insert(SubscriptionSnapshot {
            response_command_id: self.response_command_id,
            element_id: self.element_id.clone(),
            responses,
        })
    }

    /// Whether the last evaluation failed for every variable.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.latest.as_ref().is_some_and(|snapshot| {
            !snapshot.responses.is_empty()
                && snapshot
                    .responses
                    .iter()
                    .all(|response| response.status() == Status::Err)
        })
    }

    /// The snapshot cached by the last evaluation.
    #[cfg(test)]
    pub(crate) const fn latest(&self) -> Option<&SubscriptionSnapshot> {
        self.latest.as_ref()
    }

    pub fn flag_for_removal(&mut self) {
        self.flagged = true;
    }

    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.flagged
    }
}

/// The subscriptions of one session.
#[derive(Debug, Default)]
pub struct SubscriptionEngine {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionEngine {
    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter()
    }

    /// Flags every subscription on `element_id` of `domain`; returns how many.
    pub fn flag_matching(&mut self, domain: Domain, element_id: &str) -> usize {
        let mut flagged = 0;
        for subscription in &mut self.subscriptions {
            if subscription.matches(domain, element_id) && !subscription.is_flagged() {
                subscription.flag_for_removal();
                flagged += 1;
            }
        }
        flagged
    }

    /// Evaluates all subscriptions in creation order.
    pub fn evaluate_all(
        &mut self,
        dispatcher: &Dispatcher,
        session: &mut Session,
    ) -> Vec<SubscriptionSnapshot> {
        self.subscriptions
            .iter_mut()
            .map(|subscription| subscription.evaluate(dispatcher, session).clone())
            .collect()
    }

    /// Drops flagged subscriptions; returns how many were removed.
    pub fn remove_flagged(&mut self) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| !subscription.is_flagged());
        let removed = before - self.subscriptions.len();
        if removed > 0 {
            debug!(target: SUBSCRIPTION_TARGET, removed, "removed flagged subscriptions");
        }
        removed
    }

    pub(crate) fn absorb(&mut self, other: Self) {
        self.subscriptions.extend(other.subscriptions);
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
