//! Per-command view handed to handlers.

use stride_protocol::SubscriptionSnapshot;

use crate::gateway::SimulationGateway;
use crate::session::Session;
use crate::subscription::Subscription;
use crate::world::World;

use super::dispatcher::Dispatcher;
use super::errors::HandlerError;

/// Gives a handler its session and a way to re-enter the dispatcher.
pub struct HandlerContext<'a> {
    dispatcher: &'a Dispatcher,
    session: &'a mut Session,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher, session: &'a mut Session) -> Self {
        Self {
            dispatcher,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &*self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut *self.session
    }

    #[must_use]
    pub fn gateway(&self) -> &SimulationGateway {
        self.session.gateway()
    }

    /// Runs `callback` against the scenario state under the gateway lock.
    ///
    /// # Errors
    ///
    /// Fails when no scenario is loaded, or with whatever the callback
    /// returns.
    pub fn with_world<R>(
        &self,
        callback: impl FnOnce(&mut dyn World) -> Result<R, HandlerError>,
    ) -> Result<R, HandlerError> {
        self.session.gateway().access_state(callback)?
    }

    /// Evaluates every active subscription of the session.
    pub fn evaluate_subscriptions(&mut self) -> Vec<SubscriptionSnapshot> {
        self.session.evaluate_subscriptions(self.dispatcher)
    }

    /// Evaluates a subscription that is not yet owned by the session.
    pub fn evaluate(&mut self, subscription: &mut Subscription) -> SubscriptionSnapshot {
        subscription.evaluate(self.dispatcher, self.session).clone()
    }
}
