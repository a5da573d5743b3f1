//! Lead Forms
//! サイト上の各フォームの入力検証と注文ペイロードへの変換
//!
//! 検証に失敗したフォームからはリクエストを送らない。

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrorsKind};

pub use validator::ValidationErrors;

use crate::cart::{CartProduct, CartStore};
use crate::models::{CreateOrderRequest, OrderItem, OrderType};

const MSG_PHONE: &str = "Введите полный номер телефона";
const MSG_INTEREST: &str = "Выберите интерес";
const MSG_AGREE: &str = "Необходимо согласие";
const MSG_CART_EMPTY: &str = "Корзина пуста";

/// 送信エラー時の共通アラート
pub const ALERT_FAILED: &str = "Ошибка при отправке";

/// テストセットの価格（エビ追加あり / なし）
pub const SAMPLE_SET_PRICE: f64 = 990.0;
pub const SAMPLE_SET_WITH_SHRIMP_PRICE: f64 = 1380.0;

// ========================================
// Field checks
// ========================================

/// 数字以外を取り除いた電話番号
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// 11 桁（+7 / 8 始まりのロシアの番号）
pub fn is_valid_phone(phone: &str) -> bool {
    normalize_phone(phone).len() == 11
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(field_error("phone", MSG_PHONE))
    }
}

fn validate_agree(agree: &bool) -> Result<(), ValidationError> {
    if *agree {
        Ok(())
    } else {
        Err(field_error("agree", MSG_AGREE))
    }
}

/// 指定フィールドの最初のメッセージ（入力欄の横に表示する）
///
/// ネストした連絡先のエラーも探す。
pub fn message_for<'a>(errors: &'a ValidationErrors, field: &str) -> Option<&'a str> {
    if let Some(list) = errors.field_errors().get(field).copied() {
        return list.first().and_then(|e| e.message.as_deref());
    }
    errors.errors().values().find_map(|kind| match kind {
        ValidationErrorsKind::Struct(inner) => message_for(inner, field),
        _ => None,
    })
}

/// derive の検証結果にフォーム外の条件を足す
fn with_extra(
    result: Result<(), ValidationErrors>,
    extra: Option<(&'static str, &'static str)>,
) -> Result<(), ValidationErrors> {
    let Some((field, message)) = extra else {
        return result;
    };
    let mut errors = result.err().unwrap_or_else(ValidationErrors::new);
    errors.add(field, field_error(field, message));
    Err(errors)
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 全フォーム共通の連絡先
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct Contact {
    #[validate(length(min = 2, message = "Введите имя"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    fn request(&self, order_type: OrderType) -> CreateOrderRequest {
        CreateOrderRequest {
            order_type: Some(order_type),
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            ..Default::default()
        }
    }
}

// ========================================
// Form trait
// ========================================

/// カートに依存しないフォーム
pub trait LeadForm: Validate {
    /// 送信前の検証
    fn check(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }

    /// 検証済みの内容から送信ペイロードを作る
    fn to_request(&self) -> CreateOrderRequest;

    /// 送信成功時のアラート
    fn success_alert(&self) -> &'static str;

    /// 送信成功後のリセット
    fn reset(&mut self);
}

// ========================================
// Callback
// ========================================

/// 折り返し電話の依頼
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CallbackForm {
    #[validate(nested)]
    pub contact: Contact,
    pub comment: String,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl Default for CallbackForm {
    fn default() -> Self {
        Self {
            contact: Contact::default(),
            comment: String::new(),
            agree: true,
        }
    }
}

impl LeadForm for CallbackForm {
    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            comment: Some(format!("ЗАКАЗ ЗВОНКА: {}", self.comment.trim())),
            ..self.contact.request(OrderType::Retail)
        }
    }

    fn success_alert(&self) -> &'static str {
        "Заявка принята! Мы перезвоним вам скоро."
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ========================================
// Cart checkout
// ========================================

/// カートの注文確定
///
/// 商品と合計はカートから取るため、`LeadForm` ではなく `to_request(&cart)` を持つ。
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CheckoutForm {
    #[validate(nested)]
    pub contact: Contact,
    pub address: String,
    pub comment: String,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            contact: Contact::default(),
            address: String::new(),
            comment: String::new(),
            agree: true,
        }
    }
}

impl CheckoutForm {
    pub fn check(&self, cart: &CartStore) -> Result<(), ValidationErrors> {
        let empty = cart.is_empty().then_some(("cart", MSG_CART_EMPTY));
        with_extra(self.validate(), empty)
    }

    pub fn to_request(&self, cart: &CartStore) -> CreateOrderRequest {
        CreateOrderRequest {
            address: optional(&self.address),
            comment: optional(&self.comment),
            cart: Some(cart.order_items()),
            total: Some(cart.total_price()),
            ..self.contact.request(OrderType::Retail)
        }
    }

    pub fn success_alert(&self) -> &'static str {
        "Заказ принят! Мы свяжемся с вами для подтверждения."
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ========================================
// Fast order (single product)
// ========================================

/// 最初のカート追加後に出る「すぐに注文」フォーム
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct FastOrderForm {
    pub product: CartProduct,
    #[validate(nested)]
    pub contact: Contact,
    #[validate(length(min = 5, message = "Введите адрес доставки"))]
    pub address: String,
    pub comment: String,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl FastOrderForm {
    pub fn new(product: CartProduct) -> Self {
        Self {
            product,
            contact: Contact::default(),
            address: String::new(),
            comment: String::new(),
            agree: true,
        }
    }
}

impl LeadForm for FastOrderForm {
    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            address: optional(&self.address),
            comment: optional(&self.comment),
            cart: Some(vec![OrderItem {
                name: self.product.name.clone(),
                quantity: 1,
            }]),
            total: Some(self.product.price),
            ..self.contact.request(OrderType::Retail)
        }
    }

    fn success_alert(&self) -> &'static str {
        "Заказ принят! Мы перезвоним вам в течение 15 минут."
    }

    fn reset(&mut self) {
        *self = Self::new(self.product.clone());
    }
}

// ========================================
// B2B leads
// ========================================

/// 卸売リードの送信元
#[derive(Debug, Clone, PartialEq)]
pub enum B2bSource {
    /// B2B トップの価格表リクエスト
    PriceRequest,
    /// 最終 CTA（関心カテゴリ付き）
    FinalCta { interest: String },
    /// 価格表とサンプルの依頼（サンプルのチェックは初期状態でオン）
    Samples { request_samples: bool },
}

impl B2bSource {
    pub fn samples() -> Self {
        B2bSource::Samples { request_samples: true }
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct B2bLeadForm {
    pub source: B2bSource,
    #[validate(length(min = 2, message = "Введите название компании"))]
    pub company: String,
    #[validate(nested)]
    pub contact: Contact,
    #[validate(email(message = "Введите корректный email"))]
    pub email: String,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl B2bLeadForm {
    pub fn new(source: B2bSource) -> Self {
        Self {
            source,
            company: String::new(),
            contact: Contact::default(),
            email: String::new(),
            agree: true,
        }
    }

    fn source_comment(&self) -> String {
        match &self.source {
            B2bSource::PriceRequest => "Запрос прайса с главного B2B экрана".to_string(),
            B2bSource::FinalCta { interest } => format!("Финальный CTA: Интерес - {}", interest.trim()),
            B2bSource::Samples { request_samples: true } => "Запрос прайса и образцов".to_string(),
            B2bSource::Samples { request_samples: false } => "Запрос прайса".to_string(),
        }
    }
}

impl LeadForm for B2bLeadForm {
    fn check(&self) -> Result<(), ValidationErrors> {
        let missing_interest = match &self.source {
            B2bSource::FinalCta { interest } if interest.trim().is_empty() => {
                Some(("interest", MSG_INTEREST))
            }
            _ => None,
        };
        with_extra(self.validate(), missing_interest)
    }

    fn to_request(&self) -> CreateOrderRequest {
        // 注文テーブルに会社名の列はないため、コメントに含める
        let comment = format!("Компания: {}. {}", self.company.trim(), self.source_comment());
        CreateOrderRequest {
            email: optional(&self.email),
            comment: Some(comment),
            ..self.contact.request(OrderType::B2b)
        }
    }

    fn success_alert(&self) -> &'static str {
        match self.source {
            B2bSource::PriceRequest => {
                "Запрос отправлен! Прайс будет отправлен на вашу почту в ближайшее время."
            }
            B2bSource::FinalCta { .. } => {
                "Заявка отправлена! Менеджер свяжется с вами в ближайшее время."
            }
            B2bSource::Samples { .. } => {
                "Запрос отправлен! Мы свяжемся с вами для уточнения состава образцов."
            }
        }
    }

    fn reset(&mut self) {
        let source = match &self.source {
            B2bSource::FinalCta { .. } => B2bSource::FinalCta { interest: String::new() },
            B2bSource::Samples { .. } => B2bSource::samples(),
            B2bSource::PriceRequest => B2bSource::PriceRequest,
        };
        *self = Self::new(source);
    }
}

// ========================================
// Retail sample set
// ========================================

/// 小売向けテストセット
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SampleSetForm {
    #[validate(nested)]
    pub contact: Contact,
    #[validate(length(min = 5, message = "Введите адрес доставки"))]
    pub address: String,
    pub add_shrimp: bool,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl Default for SampleSetForm {
    fn default() -> Self {
        Self {
            contact: Contact::default(),
            address: String::new(),
            add_shrimp: false,
            agree: true,
        }
    }
}

impl LeadForm for SampleSetForm {
    fn to_request(&self) -> CreateOrderRequest {
        let (shrimp, total) = if self.add_shrimp {
            ("Да", SAMPLE_SET_WITH_SHRIMP_PRICE)
        } else {
            ("Нет", SAMPLE_SET_PRICE)
        };
        CreateOrderRequest {
            address: optional(&self.address),
            comment: Some(format!("Тестовый набор (Креветки: {})", shrimp)),
            total: Some(total),
            ..self.contact.request(OrderType::Retail)
        }
    }

    fn success_alert(&self) -> &'static str {
        "Заказ на тестовый набор принят! Мы свяжемся с вами в ближайшее время."
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ========================================
// Retail discount CTA / exit coupon
// ========================================

/// 初回注文 15% 割引の申し込み
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct DiscountForm {
    #[validate(nested)]
    pub contact: Contact,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl Default for DiscountForm {
    fn default() -> Self {
        Self {
            contact: Contact::default(),
            agree: true,
        }
    }
}

impl LeadForm for DiscountForm {
    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            comment: Some("Заявка на скидку 15% на первый заказ".to_string()),
            ..self.contact.request(OrderType::Retail)
        }
    }

    fn success_alert(&self) -> &'static str {
        "Заявка отправлена! Ваша скидка забронирована."
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 離脱時ポップアップのクーポン申し込み
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ExitCouponForm {
    #[validate(nested)]
    pub contact: Contact,
    #[validate(custom(function = "validate_agree"))]
    pub agree: bool,
}

impl Default for ExitCouponForm {
    fn default() -> Self {
        Self {
            contact: Contact::default(),
            agree: true,
        }
    }
}

impl LeadForm for ExitCouponForm {
    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            comment: Some("Промокод при уходе с сайта".to_string()),
            ..self.contact.request(OrderType::Retail)
        }
    }

    fn success_alert(&self) -> &'static str {
        "Промокод отправлен!"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_contact() -> Contact {
        Contact::new("Иван", "+7 (999) 123-45-67")
    }

    fn product(id: &str, name: &str, price: f64) -> CartProduct {
        CartProduct {
            id: id.to_string(),
            name: name.to_string(),
            price,
            weight: "1 кг".to_string(),
            image: String::new(),
        }
    }

    fn b2b_form(source: B2bSource) -> B2bLeadForm {
        let mut form = B2bLeadForm::new(source);
        form.company = "ООО Рыба".to_string();
        form.contact = valid_contact();
        form.email = "zakaz@ryba.ru".to_string();
        form
    }

    #[test]
    fn phone_is_normalized_to_digits() {
        assert_eq!(normalize_phone("+7 (999) 123-45-67"), "79991234567");
        assert!(is_valid_phone("8 999 123 45 67"));
        assert!(!is_valid_phone("+7 (999) 123-45-6"));
        assert!(!is_valid_phone("+7 (999) 123-45-678"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn short_phone_is_rejected_before_sending() {
        let form = CallbackForm {
            contact: Contact::new("Иван", "+7 999 123"),
            ..Default::default()
        };
        let errors = form.check().expect_err("must fail");
        assert_eq!(message_for(&errors, "phone"), Some(MSG_PHONE));
        assert_eq!(message_for(&errors, "name"), None);
    }

    #[test]
    fn short_name_uses_form_message() {
        let form = CallbackForm {
            contact: Contact::new("И", "+7 (999) 123-45-67"),
            ..Default::default()
        };
        let errors = form.check().expect_err("must fail");
        assert_eq!(message_for(&errors, "name"), Some("Введите имя"));
    }

    #[test]
    fn consent_is_required() {
        let form = DiscountForm {
            contact: valid_contact(),
            agree: false,
        };
        let errors = form.check().expect_err("must fail");
        assert_eq!(message_for(&errors, "agree"), Some(MSG_AGREE));
        assert_eq!(errors.field_errors().len(), 1);
        assert!(!errors.errors().contains_key("contact"));
    }

    #[test]
    fn callback_comment_is_prefixed() {
        let form = CallbackForm {
            contact: valid_contact(),
            comment: "после 18:00".to_string(),
            agree: true,
        };
        assert!(form.check().is_ok());
        let req = form.to_request();
        assert_eq!(req.order_type, Some(OrderType::Retail));
        assert_eq!(req.comment.as_deref(), Some("ЗАКАЗ ЗВОНКА: после 18:00"));
        assert_eq!(req.cart, None);
    }

    #[test]
    fn checkout_carries_cart_lines_and_total() {
        let mut cart = CartStore::new();
        let salmon = product("p1", "Стейк сёмги", 1290.0);
        cart.add_to_cart(&salmon);
        cart.add_to_cart(&salmon);
        cart.add_to_cart(&product("p2", "Филе трески", 580.0));

        let form = CheckoutForm {
            contact: valid_contact(),
            address: "Москва, ул. Ленина 1".to_string(),
            ..Default::default()
        };
        assert!(form.check(&cart).is_ok());

        let req = form.to_request(&cart);
        assert_eq!(req.total, Some(3160.0));
        assert_eq!(
            req.cart,
            Some(vec![
                OrderItem { name: "Стейк сёмги".to_string(), quantity: 2 },
                OrderItem { name: "Филе трески".to_string(), quantity: 1 },
            ])
        );
        assert_eq!(req.comment, None);
    }

    #[test]
    fn checkout_of_empty_cart_is_rejected() {
        let form = CheckoutForm {
            contact: valid_contact(),
            ..Default::default()
        };
        let errors = form.check(&CartStore::new()).expect_err("must fail");
        assert_eq!(message_for(&errors, "cart"), Some(MSG_CART_EMPTY));
    }

    #[test]
    fn empty_cart_error_is_added_to_field_errors() {
        let form = CheckoutForm {
            contact: Contact::new("", "123"),
            agree: false,
            ..Default::default()
        };
        let errors = form.check(&CartStore::new()).expect_err("must fail");
        assert_eq!(message_for(&errors, "cart"), Some(MSG_CART_EMPTY));
        assert_eq!(message_for(&errors, "agree"), Some(MSG_AGREE));
        assert_eq!(message_for(&errors, "phone"), Some(MSG_PHONE));
    }

    #[test]
    fn fast_order_requires_address_and_sends_single_item() {
        let mut form = FastOrderForm::new(product("p3", "Креветки королевские 16/20", 1190.0));
        form.contact = valid_contact();
        let errors = form.check().expect_err("no address");
        assert_eq!(message_for(&errors, "address"), Some("Введите адрес доставки"));

        form.address = "Москва".to_string();
        assert!(form.check().is_ok());
        let req = form.to_request();
        assert_eq!(
            req.cart,
            Some(vec![OrderItem { name: "Креветки королевские 16/20".to_string(), quantity: 1 }])
        );
        assert_eq!(req.total, Some(1190.0));

        form.reset();
        assert_eq!(form.product.id, "p3");
        assert!(form.contact.name.is_empty());
    }

    #[test]
    fn b2b_lead_validates_company_and_email() {
        let mut form = B2bLeadForm::new(B2bSource::PriceRequest);
        form.contact = valid_contact();
        form.email = "not-an-email".to_string();

        let errors = form.check().expect_err("must fail");
        assert_eq!(message_for(&errors, "company"), Some("Введите название компании"));
        assert_eq!(message_for(&errors, "email"), Some("Введите корректный email"));

        form.company = "Ресторан Нептун".to_string();
        form.email = "buyer@neptun.ru".to_string();
        assert!(form.check().is_ok());

        let req = form.to_request();
        assert_eq!(req.order_type, Some(OrderType::B2b));
        assert_eq!(req.email.as_deref(), Some("buyer@neptun.ru"));
        assert_eq!(
            req.comment.as_deref(),
            Some("Компания: Ресторан Нептун. Запрос прайса с главного B2B экрана")
        );
    }

    #[test]
    fn b2b_final_cta_needs_interest() {
        let mut form = b2b_form(B2bSource::FinalCta { interest: String::new() });
        let errors = form.check().expect_err("no interest");
        assert_eq!(message_for(&errors, "interest"), Some(MSG_INTEREST));

        form.source = B2bSource::FinalCta { interest: "Креветки".to_string() };
        assert!(form.check().is_ok());
        assert!(form
            .to_request()
            .comment
            .is_some_and(|c| c.ends_with("Финальный CTA: Интерес - Креветки")));
    }

    #[test]
    fn b2b_samples_checkbox_controls_comment() {
        let mut form = b2b_form(B2bSource::samples());
        assert_eq!(
            form.to_request().comment.as_deref(),
            Some("Компания: ООО Рыба. Запрос прайса и образцов")
        );

        form.source = B2bSource::Samples { request_samples: false };
        assert!(form.check().is_ok());
        assert_eq!(form.to_request().comment.as_deref(), Some("Компания: ООО Рыба. Запрос прайса"));

        form.reset();
        assert_eq!(form.source, B2bSource::Samples { request_samples: true });
    }

    #[test]
    fn sample_set_total_depends_on_shrimp() {
        let mut form = SampleSetForm {
            contact: valid_contact(),
            address: "Санкт-Петербург".to_string(),
            ..Default::default()
        };
        assert_eq!(form.to_request().total, Some(990.0));
        assert_eq!(form.to_request().comment.as_deref(), Some("Тестовый набор (Креветки: Нет)"));

        form.add_shrimp = true;
        assert_eq!(form.to_request().total, Some(1380.0));
        assert_eq!(form.to_request().comment.as_deref(), Some("Тестовый набор (Креветки: Да)"));
    }

    #[test]
    fn reset_clears_fields_and_restores_consent_default() {
        let mut form = ExitCouponForm {
            contact: valid_contact(),
            agree: false,
        };
        form.reset();
        assert_eq!(form, ExitCouponForm::default());
        assert!(form.agree);
    }
}
