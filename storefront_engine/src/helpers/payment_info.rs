use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Tenge};

/// Where customers send their bank transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentTarget {
    pub phone: String,
    pub qr_code_url: String,
}

/// Human-readable payment steps, per language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instructions {
    pub ru: String,
    pub kk: String,
}

impl Instructions {
    pub fn for_target(target: &PaymentTarget) -> Self {
        let phone = target.phone.as_str();
        let ru = format!(
            "📱 Как оплатить через Kaspi:\n\n1. Откройте приложение Kaspi\n2. Отсканируйте QR-код или переведите на \
             номер: {phone}\n3. В комментарии к переводу укажите номер заказа\n4. После оплаты нажмите \"Я оплатил\" \
             в боте\n5. Отправьте скриншот чека\n\nПосле проверки оплаты вам будет начислен кэшбэк!"
        );
        let kk = format!(
            "📱 Kaspi арқылы төлеу:\n\n1. Kaspi қосымшасын ашыңыз\n2. QR кодты сканерлеңіз немесе нөмірге \
             аударыңыз: {phone}\n3. Түсініктемеде тапсырыс нөмірін көрсетіңіз\n4. Төлегеннен кейін ботта \"Мен \
             төледім\" басыңыз\n5. Чек скриншотын жіберіңіз\n\nТөлем тексерілгеннен кейін кэшбэк есептеледі!"
        );
        Self { ru, kk }
    }
}

/// The payment payload returned to the client alongside an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub order_number: i64,
    pub amount: Tenge,
    pub cashback_amount: Tenge,
    pub kaspi_phone: String,
    pub qr_code_url: String,
    pub instructions: Instructions,
}

impl PaymentInstructions {
    pub fn new(order: &Order, target: &PaymentTarget) -> Self {
        Self {
            order_number: order.order_number,
            amount: order.total_amount,
            cashback_amount: order.cashback_earned,
            kaspi_phone: target.phone.clone(),
            qr_code_url: target.qr_code_url.clone(),
            instructions: Instructions::for_target(target),
        }
    }
}
