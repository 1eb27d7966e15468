//! Customer- and operator-facing message templates. The shop talks to its customers in Russian.
use crate::{
    bot_objects::CallbackAction,
    db_types::{Order, OrderId, Tenge},
    helpers::PaymentTarget,
    state_machine::Notice,
    traits::Button,
};

pub const APPROVED_BANNER: &str = "✅ ОПЛАТА ПОДТВЕРЖДЕНА";
pub const REJECTED_BANNER: &str = "❌ ОПЛАТА ОТКЛОНЕНА";

pub const ACK_NOT_OPERATOR: &str = "❌ У вас нет прав администратора";
pub const ACK_CONFIRMED: &str = "✅ Оплата подтверждена";
pub const ACK_REJECTED: &str = "❌ Оплата отклонена";
pub const ACK_ALREADY_SETTLED: &str = "ℹ️ Оплата по этому заказу уже обработана";
pub const ACK_ORDER_NOT_FOUND: &str = "❓ Заказ не найден";
pub const ACK_NOT_ALLOWED: &str = "⚠️ Это действие сейчас недоступно для заказа";
pub const ACK_NOT_YOUR_ORDER: &str = "⚠️ Это не ваш заказ";

/// A rendered outbound message. `photo` is set for photo messages, in which case `text` is the caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub photo: Option<String>,
    pub buttons: Vec<Button>,
}

impl Rendered {
    fn text<S: Into<String>>(text: S) -> Self {
        Self { text: text.into(), photo: None, buttons: Vec::new() }
    }
}

pub fn greeting(frontend_url: &str) -> Rendered {
    Rendered {
        text: "👋 Добро пожаловать в Fashion Store!\n\nНажмите кнопку ниже, чтобы открыть магазин:".to_string(),
        photo: None,
        buttons: vec![Button::web_app("🛍️ Открыть магазин", frontend_url)],
    }
}

pub fn order_created(order: &Order, target: &PaymentTarget) -> Rendered {
    let text = format!(
        "✅ Заказ №{number} оформлен!\n\n💰 Сумма к оплате: {total}\n🎁 Вы получите кэшбэк: {cashback}\n\n📱 Для \
         оплаты переведите сумму на Kaspi:\nНомер: {phone}\nКомментарий: Заказ {number}\n\nПосле оплаты нажмите \
         кнопку ниже и отправьте скриншот чека.",
        number = order.order_number,
        total = order.total_amount,
        cashback = order.cashback_earned,
        phone = target.phone,
    );
    Rendered { text, photo: None, buttons: vec![Button::callback("✅ Я оплатил", CallbackAction::MarkPaid(order.id))] }
}

fn review_buttons(order_id: OrderId) -> Vec<Button> {
    vec![
        Button::callback("✅ Подтвердить", CallbackAction::ConfirmPayment(order_id)),
        Button::callback("❌ Отклонить", CallbackAction::RejectPayment(order_id)),
    ]
}

pub fn render(notice: &Notice) -> Rendered {
    match notice {
        Notice::ScreenshotPrompt { .. } => Rendered::text(
            "📸 Отлично! Теперь отправьте скриншот чека из Kaspi.\n\nСкриншот должен содержать:\n✅ Сумму \
             перевода\n✅ Дату и время\n✅ Номер заказа в комментарии",
        ),
        Notice::ScreenshotReceived { cashback, .. } => Rendered::text(format!(
            "✅ Чек получен!\n\n⏳ Мы проверим оплату и подтвердим ваш заказ в течение нескольких минут.\n\nПосле \
             подтверждения вам будет начислено {cashback} кэшбэка!"
        )),
        Notice::ReviewRequest { order_id, order_number, total, phone, delivery_address, photo } => Rendered {
            text: format!(
                "🔔 НОВАЯ ОПЛАТА НА ПРОВЕРКУ\n\nЗаказ: {order_number}\nСумма: {total}\nКлиент: {phone}\nАдрес: \
                 {delivery_address}\n\nПроверьте скриншот чека выше ⬆️"
            ),
            photo: Some(photo.clone()),
            buttons: review_buttons(*order_id),
        },
        Notice::PaymentConfirmed { order_number, cashback, .. } => Rendered::text(format!(
            "🎉 Оплата подтверждена!\n\n✅ Заказ №{order_number} принят в работу\n{}\n\nСпасибо за покупку! Мы скоро с \
             вами свяжемся для уточнения деталей доставки.",
            cashback_line(*cashback)
        )),
        Notice::PaymentRejected { order_number, .. } => Rendered::text(format!(
            "❌ К сожалению, оплата не подтверждена.\n\nЗаказ №{order_number}\n\nПожалуйста, проверьте данные платежа \
             и попробуйте снова, или свяжитесь с нами для уточнения деталей."
        )),
    }
}

/// The operator's review message, with the outcome banner prepended.
pub fn with_banner(banner: &str, caption: Option<&str>) -> String {
    match caption {
        Some(c) if !c.is_empty() => format!("{banner}\n\n{c}"),
        _ => banner.to_string(),
    }
}

pub fn cashback_line(amount: Tenge) -> String {
    format!("💰 Начислено кэшбэка: {amount}")
}
