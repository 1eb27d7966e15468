use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    bot_objects::{BotEvent, BotOutcome, CallbackAction, MessageRef},
    db_types::{NewOrder, Order, OrderId, PricedLine, PricedOrder, Tenge, TelegramId},
    helpers::{cashback_for, PaymentInstructions, PaymentTarget},
    messages,
    messages::Rendered,
    order_objects::{FlowOutcome, OrderCreated, TransitionResult, VerifyDecision},
    state_machine::{notices, transition, Actor, Decision, Notice, PaymentEvent, SideEffect},
    traits::{Notifier, OperatorPolicy, StorefrontDatabase, StorefrontError},
};

/// Shop-level settings the order flow needs to talk to customers and operators.
#[derive(Debug, Clone, Default)]
pub struct FlowSettings {
    pub payment_target: PaymentTarget,
    /// The web app that the greeting message opens.
    pub frontend_url: String,
    /// Chats that receive payment review requests.
    pub review_chats: Vec<TelegramId>,
}

/// `OrderFlowApi` is the primary API for the order and payment lifecycle. It handles customer orders, the "I paid"
/// and screenshot bot events, and operator verification from either the HTTP API or the bot.
///
/// Decisions are made by the pure [`transition`] function. This API persists them through the backend's conditional
/// update, so that concurrent actors can never both move the same order, and then dispatches the resulting
/// notifications. Notifications are only attempted after the state change has committed, and a failed notification
/// is logged and counted, never propagated.
pub struct OrderFlowApi<B, N> {
    db: B,
    notifier: N,
    policy: Arc<dyn OperatorPolicy>,
    settings: FlowSettings,
}

impl<B, N> Debug for OrderFlowApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone, N: Clone> Clone for OrderFlowApi<B, N> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            notifier: self.notifier.clone(),
            policy: Arc::clone(&self.policy),
            settings: self.settings.clone(),
        }
    }
}

impl<B, N> OrderFlowApi<B, N> {
    pub fn new(db: B, notifier: N, policy: Arc<dyn OperatorPolicy>, settings: FlowSettings) -> Self {
        Self { db, notifier, policy, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn is_operator(&self, id: TelegramId) -> bool {
        self.policy.is_operator(id)
    }

    fn actor(&self, id: TelegramId) -> Actor {
        Actor { id, is_operator: self.is_operator(id) }
    }
}

impl<B, N> OrderFlowApi<B, N>
where
    B: StorefrontDatabase,
    N: Notifier,
{
    /// Places a new order.
    ///
    /// Every line is priced from the catalog (sale price if there is one) and checked against stock. If any variant is
    /// missing or short, the whole order is rejected with [`StorefrontError::OutOfStock`] naming the first offending
    /// item, and nothing is persisted. Otherwise the order is saved, and its stock reserved, in one transaction.
    ///
    /// The customer is then sent the payment details and an "I paid" button.
    pub async fn create_order(&self, order: NewOrder) -> Result<OrderCreated, StorefrontError> {
        validate_new_order(&order)?;
        let priced = self.price_order(order).await?;
        let customer = priced.customer.id();
        let details = self.db.insert_order_reserving_stock(priced).await?;
        let new_order = &details.order;
        info!(
            "🔄️📦️ Order #{} (id {}) placed by {customer} for {}. Cashback on approval: {}",
            new_order.order_number, new_order.id, new_order.total_amount, new_order.cashback_earned
        );
        let msg = messages::order_created(new_order, &self.settings.payment_target);
        let failed = usize::from(!self.deliver(customer, &msg).await);
        let payment_data = PaymentInstructions::new(new_order, &self.settings.payment_target);
        Ok(OrderCreated { order: details, payment_data, notifications_failed: failed })
    }

    async fn price_order(&self, order: NewOrder) -> Result<PricedOrder, StorefrontError> {
        let mut lines = Vec::with_capacity(order.items.len());
        for req in &order.items {
            let variant = self.db.fetch_priced_variant(req.product_id, &req.size, &req.color).await?;
            let variant = match variant {
                Some(v) if v.stock_quantity >= req.quantity => v,
                Some(v) => {
                    debug!(
                        "🔄️📦️ {} has {} in stock, but {} were requested",
                        v.describe(),
                        v.stock_quantity,
                        req.quantity
                    );
                    return Err(StorefrontError::OutOfStock { item: v.describe() });
                },
                None => {
                    debug!("🔄️📦️ {} does not exist", req.describe());
                    return Err(StorefrontError::OutOfStock { item: req.describe() });
                },
            };
            let unit_price = variant.unit_price();
            lines.push(PricedLine {
                product_id: variant.product_id,
                product_name: variant.product_name,
                size: variant.size,
                color: variant.color,
                quantity: req.quantity,
                unit_price,
            });
        }
        let total_amount: Tenge = lines.iter().map(PricedLine::line_total).sum();
        let cashback_earned = cashback_for(total_amount);
        Ok(PricedOrder {
            customer: order.customer,
            lines,
            total_amount,
            cashback_earned,
            delivery_address: order.delivery_address,
            phone: order.phone,
            notes: order.notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// The customer says they have transferred the money for `order_id`.
    pub async fn mark_paid(&self, customer: TelegramId, order_id: OrderId) -> Result<FlowOutcome, StorefrontError> {
        let order = self.fetch_order(order_id).await?;
        self.drive(order, PaymentEvent::MarkPaid, self.actor(customer)).await
    }

    /// The customer sent a receipt screenshot. It is attached to their most recently created order that is waiting
    /// for one. Other waiting orders are left alone.
    ///
    /// Returns `None`, and does nothing else, if no order is waiting for a screenshot.
    pub async fn submit_screenshot(
        &self,
        customer: TelegramId,
        photo: String,
    ) -> Result<Option<FlowOutcome>, StorefrontError> {
        let order = match self.db.fetch_latest_awaiting_screenshot(customer).await? {
            Some(o) => o,
            None => {
                debug!("🔄️📸️ {customer} sent a photo, but has no order awaiting a screenshot. Ignoring it.");
                return Ok(None);
            },
        };
        let event = PaymentEvent::SubmitScreenshot { photo };
        self.drive(order, event, self.actor(customer)).await.map(Some)
    }

    /// An operator approves or rejects the payment for `order_id`.
    ///
    /// Only orders in `verification` can be decided. Deciding an order that is already `paid` or `failed` is a no-op:
    /// no cashback is credited and nobody is notified again. The same holds when two operators race: exactly one of
    /// them moves the order.
    pub async fn verify_payment(
        &self,
        operator: TelegramId,
        order_id: OrderId,
        decision: VerifyDecision,
    ) -> Result<FlowOutcome, StorefrontError> {
        if !self.is_operator(operator) {
            warn!("🔄️🔐️ {operator} tried to mark order {order_id} as {decision}, but is not an operator");
            return Err(StorefrontError::Unauthorized(operator));
        }
        let order = self.fetch_order(order_id).await?;
        self.drive(order, decision.event(), Actor::operator(operator)).await
    }

    /// Handles the bot's `/start` command with a welcome message that opens the shop.
    pub async fn greet(&self, chat: TelegramId) -> BotOutcome {
        let msg = messages::greeting(&self.settings.frontend_url);
        self.deliver(chat, &msg).await;
        BotOutcome::Greeted
    }

    /// The single entry point for bot events.
    ///
    /// Button taps are always acknowledged, whatever the outcome. Business refusals (not authorized, wrong state,
    /// unknown order) are reported to the user in the acknowledgement and returned as [`BotOutcome::Declined`].
    /// Only dependency failures are returned as errors.
    pub async fn handle_bot_event(&self, event: BotEvent) -> Result<BotOutcome, StorefrontError> {
        match event {
            BotEvent::Start { chat } => Ok(self.greet(chat).await),
            BotEvent::Photo { from, file_id } => {
                let outcome = self.submit_screenshot(from, file_id).await?;
                Ok(outcome.map(BotOutcome::Flow).unwrap_or(BotOutcome::Ignored))
            },
            BotEvent::ButtonTap { callback_id, action: None, .. } => {
                debug!("🔄️🤖️ Unrecognised button tap {callback_id}. Acknowledging it and moving on.");
                self.ack(&callback_id, None).await;
                Ok(BotOutcome::Ignored)
            },
            BotEvent::ButtonTap { callback_id, from, action: Some(action), origin } => {
                self.handle_button(&callback_id, from, action, origin).await
            },
        }
    }

    async fn handle_button(
        &self,
        callback_id: &str,
        from: TelegramId,
        action: CallbackAction,
        origin: Option<MessageRef>,
    ) -> Result<BotOutcome, StorefrontError> {
        let result = match action {
            CallbackAction::MarkPaid(id) => self.mark_paid(from, id).await,
            CallbackAction::ConfirmPayment(id) => self.verify_payment(from, id, VerifyDecision::Paid).await,
            CallbackAction::RejectPayment(id) => self.verify_payment(from, id, VerifyDecision::Failed).await,
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(StorefrontError::DatabaseError(e)) => {
                self.ack(callback_id, None).await;
                return Err(StorefrontError::DatabaseError(e));
            },
            Err(e) => {
                let text = match (&e, action) {
                    (StorefrontError::Unauthorized(_), CallbackAction::MarkPaid(_)) => messages::ACK_NOT_YOUR_ORDER,
                    (StorefrontError::Unauthorized(_), _) => messages::ACK_NOT_OPERATOR,
                    (StorefrontError::OrderNotFound(_), _) => messages::ACK_ORDER_NOT_FOUND,
                    _ => messages::ACK_NOT_ALLOWED,
                };
                info!("🔄️🤖️ Button tap '{action}' by {from} declined. {e}");
                self.ack(callback_id, Some(text)).await;
                return Ok(BotOutcome::Declined(e.to_string()));
            },
        };
        match (action, outcome.result) {
            (CallbackAction::MarkPaid(_), _) => self.ack(callback_id, None).await,
            (_, TransitionResult::NoOp | TransitionResult::Repeated) => {
                self.ack(callback_id, Some(messages::ACK_ALREADY_SETTLED)).await
            },
            (CallbackAction::ConfirmPayment(_), TransitionResult::Applied) => {
                self.ack(callback_id, Some(messages::ACK_CONFIRMED)).await;
                self.edit_origin(origin, messages::APPROVED_BANNER).await;
            },
            (CallbackAction::RejectPayment(_), TransitionResult::Applied) => {
                self.ack(callback_id, Some(messages::ACK_REJECTED)).await;
                self.edit_origin(origin, messages::REJECTED_BANNER).await;
            },
        }
        Ok(BotOutcome::Flow(outcome))
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Order, StorefrontError> {
        self.db.fetch_order(id).await?.ok_or(StorefrontError::OrderNotFound(id))
    }

    /// Runs `event` through the state machine and commits the result.
    async fn drive(&self, order: Order, event: PaymentEvent, actor: Actor) -> Result<FlowOutcome, StorefrontError> {
        let order_id = order.id;
        match transition(&order, &event, &actor)? {
            Decision::Advance(t) => match self.db.apply_transition(order_id, &t).await? {
                Some(updated) => {
                    info!("🔄️💳️ Order {order_id} moved from {} to {} on '{event}' by {}", t.from, t.to, actor.id);
                    if let Some((_, amount)) = t.cashback_credit() {
                        info!("🔄️💰️ {amount} cashback credited for order {order_id}");
                    }
                    let (sent, failed) = self.dispatch(&t.effects).await;
                    Ok(FlowOutcome {
                        order: updated,
                        result: TransitionResult::Applied,
                        notifications_sent: sent,
                        notifications_failed: failed,
                    })
                },
                None => {
                    // Somebody else moved the order between our read and our conditional update.
                    let current = self.fetch_order(order_id).await?;
                    info!(
                        "🔄️💳️ Order {order_id} is now {} and no longer {}. '{event}' by {} had no effect.",
                        current.payment_status, t.from, actor.id
                    );
                    Ok(FlowOutcome::no_op(current))
                },
            },
            Decision::Repeat(effects) => {
                debug!("🔄️💳️ Order {order_id} is already {}. Repeating messages for '{event}'", order.payment_status);
                let (sent, failed) = self.dispatch(&effects).await;
                Ok(FlowOutcome {
                    order,
                    result: TransitionResult::Repeated,
                    notifications_sent: sent,
                    notifications_failed: failed,
                })
            },
            Decision::AlreadySettled => {
                info!("🔄️💳️ Order {order_id} is already {}. Ignoring '{event}' by {}", order.payment_status, actor.id);
                Ok(FlowOutcome::no_op(order))
            },
        }
    }

    /// Sends every notice in `effects`. Returns the number of messages sent and failed.
    async fn dispatch(&self, effects: &[SideEffect]) -> (usize, usize) {
        let mut sent = 0;
        let mut failed = 0;
        for notice in notices(effects) {
            let msg = messages::render(notice);
            let recipients = match notice {
                Notice::ReviewRequest { order_number, .. } => {
                    if self.settings.review_chats.is_empty() {
                        warn!("📬️ No operators are configured to review the payment for order #{order_number}");
                    }
                    self.settings.review_chats.clone()
                },
                Notice::ScreenshotPrompt { chat } |
                Notice::ScreenshotReceived { chat, .. } |
                Notice::PaymentConfirmed { chat, .. } |
                Notice::PaymentRejected { chat, .. } => vec![*chat],
            };
            for chat in recipients {
                if self.deliver(chat, &msg).await {
                    sent += 1;
                } else {
                    failed += 1;
                }
            }
        }
        (sent, failed)
    }

    async fn deliver(&self, chat: TelegramId, msg: &Rendered) -> bool {
        let result = match &msg.photo {
            Some(photo) => self.notifier.send_photo(chat, photo, &msg.text, &msg.buttons).await,
            None => self.notifier.send_message(chat, &msg.text, &msg.buttons).await,
        };
        match result {
            Ok(()) => {
                trace!("📬️ Message delivered to {chat}");
                true
            },
            Err(e) => {
                warn!("📬️ Could not notify {chat}. The order flow is unaffected. {e}");
                false
            },
        }
    }

    async fn ack(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.notifier.answer_callback(callback_id, text, text.is_some()).await {
            warn!("📬️ Could not acknowledge button tap {callback_id}. {e}");
        }
    }

    async fn edit_origin(&self, origin: Option<MessageRef>, banner: &str) {
        let Some(origin) = origin else {
            return;
        };
        let caption = messages::with_banner(banner, origin.caption.as_deref());
        if let Err(e) = self.notifier.edit_caption(origin.chat, origin.message_id, &caption).await {
            warn!("📬️ Could not update review message {} in chat {}. {e}", origin.message_id, origin.chat);
        }
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), StorefrontError> {
    if order.items.is_empty() {
        return Err(StorefrontError::Validation("An order needs at least one item".into()));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity <= 0) {
        return Err(StorefrontError::Validation(format!("Quantity for {} must be positive", item.describe())));
    }
    if order.delivery_address.trim().is_empty() {
        return Err(StorefrontError::Validation("A delivery address is required".into()));
    }
    if order.phone.trim().is_empty() {
        return Err(StorefrontError::Validation("A contact phone number is required".into()));
    }
    Ok(())
}
