/// 상품 유효성 검사
/// 모든 위반 사항을 한 번에 모아서 속성별 메시지로 돌려준다.
// region:    --- Imports
use super::model::{beginning_of_day, Item, ItemStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
// endregion: --- Imports

// region:    --- Messages
pub const BLANK: &str = "can't be blank";
pub const NOT_A_NUMBER: &str = "is not a number";
pub const NOT_POSITIVE: &str = "must be greater than 0";
pub const NOT_INCLUDED: &str = "is not included in the list";
pub const EARLIER_THAN_TODAY: &str = "can't be earlier than today";
pub const MUST_EXIST: &str = "must exist";
// endregion: --- Messages

// region:    --- Validation Errors
/// 속성 이름 -> 메시지 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: &str, message: &str) {
        self.0
            .entry(attribute.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, attribute: &str) -> &[String] {
        self.0.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    /// "price must be greater than 0" 형태의 전체 메시지
    pub fn full_messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(attribute, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{} {}", attribute, message))
            })
            .collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}
// endregion: --- Validation Errors

// region:    --- Candidate Item
/// 검사 컨텍스트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationContext {
    #[default]
    Default,
    /// 구매자 선택 시에는 마감일이 지났어도 통과시킨다
    SelectBuyer,
}

/// 저장 전의 상품 상태
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub user_id: Option<UserId>,
    pub buyer_id: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub shipping_cost_covered: Option<bool>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ItemStatus,
    /// 값은 있었지만 형식이 맞지 않았던 속성
    #[serde(skip)]
    pub malformed: BTreeSet<String>,
}

/// 요청 본문의 속성 값
/// 타입이 맞지 않아도 역직렬화는 성공시키고 검사 단계에서 오류로 보고한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input<T> {
    Valid(T),
    Invalid(serde_json::Value),
}

impl<T> From<T> for Input<T> {
    fn from(value: T) -> Self {
        Input::Valid(value)
    }
}

impl Input<i64> {
    /// "1500" 같은 숫자 문자열도 받아준다
    fn into_price(self) -> Input<i64> {
        match self {
            Input::Invalid(serde_json::Value::String(text)) => match text.trim().parse() {
                Ok(price) => Input::Valid(price),
                Err(_) => Input::Invalid(serde_json::Value::String(text)),
            },
            other => other,
        }
    }
}

impl Input<bool> {
    /// 폼에서 오는 "true" / "false" / "1" / "0"
    fn into_flag(self) -> Input<bool> {
        match self {
            Input::Invalid(serde_json::Value::String(text)) => match text.trim() {
                "true" | "1" => Input::Valid(true),
                "false" | "0" => Input::Valid(false),
                _ => Input::Invalid(serde_json::Value::String(text)),
            },
            other => other,
        }
    }
}

/// 부분 수정 요청 (None 이면 기존 값 유지)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub name: Option<Input<String>>,
    pub description: Option<Input<String>>,
    pub price: Option<Input<i64>>,
    pub shipping_cost_covered: Option<Input<bool>>,
    pub deadline: Option<Input<DateTime<Utc>>>,
}

/// 검사를 통과한 상품 상태
#[derive(Debug, Clone, PartialEq)]
pub struct ValidItem {
    pub user_id: UserId,
    pub buyer_id: Option<UserId>,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub shipping_cost_covered: bool,
    pub deadline: DateTime<Utc>,
    pub status: ItemStatus,
}

impl From<&Item> for ItemAttributes {
    fn from(item: &Item) -> Self {
        Self {
            user_id: Some(item.user_id),
            buyer_id: item.buyer_id,
            name: Some(item.name.clone()),
            description: Some(item.description.clone()),
            price: Some(item.price),
            shipping_cost_covered: Some(item.shipping_cost_covered),
            deadline: Some(item.deadline),
            status: item.status,
            malformed: BTreeSet::new(),
        }
    }
}

impl ItemAttributes {
    pub fn apply(mut self, changes: ItemChanges) -> Self {
        if let Some(name) = changes.name {
            self.name = self.accept("name", name);
        }
        if let Some(description) = changes.description {
            self.description = self.accept("description", description);
        }
        if let Some(price) = changes.price {
            self.price = self.accept("price", price.into_price());
        }
        if let Some(covered) = changes.shipping_cost_covered {
            self.shipping_cost_covered = self.accept("shipping_cost_covered", covered.into_flag());
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = self.accept("deadline", deadline);
        }
        self
    }

    fn accept<T>(&mut self, attribute: &str, input: Input<T>) -> Option<T> {
        match input {
            Input::Valid(value) => {
                self.malformed.remove(attribute);
                Some(value)
            }
            // 빈 문자열은 값이 없는 것으로 본다
            Input::Invalid(serde_json::Value::String(text)) if text.trim().is_empty() => None,
            Input::Invalid(_) => {
                self.malformed.insert(attribute.to_string());
                None
            }
        }
    }

    pub fn validate(
        &self,
        context: ValidationContext,
        now: DateTime<Utc>,
    ) -> Result<ValidItem, ValidationErrors> {
        self.validate_with(context, now, ValidationErrors::new())
    }

    /// 호출자가 미리 모은 오류(예: 판매자 부재)와 합쳐서 검사
    pub fn validate_with(
        &self,
        context: ValidationContext,
        now: DateTime<Utc>,
        mut errors: ValidationErrors,
    ) -> Result<ValidItem, ValidationErrors> {
        if self.user_id.is_none() {
            errors.add("user", MUST_EXIST);
        }

        let name = present(self.name.as_deref());
        if name.is_none() {
            errors.add("name", BLANK);
        }

        let description = present(self.description.as_deref());
        if description.is_none() {
            errors.add("description", BLANK);
        }

        match self.price {
            None if self.malformed.contains("price") => errors.add("price", NOT_A_NUMBER),
            None => {
                errors.add("price", BLANK);
                errors.add("price", NOT_A_NUMBER);
            }
            Some(price) if price <= 0 => errors.add("price", NOT_POSITIVE),
            Some(_) => {}
        }

        if self.shipping_cost_covered.is_none() {
            errors.add("shipping_cost_covered", NOT_INCLUDED);
        }

        if self.deadline.is_none() {
            errors.add("deadline", BLANK);
        }

        if context != ValidationContext::SelectBuyer {
            let today = beginning_of_day(now);
            match self.deadline {
                Some(deadline) if deadline >= today => {}
                _ => errors.add("deadline", EARLIER_THAN_TODAY),
            }
        }

        match (
            self.user_id,
            name,
            description,
            self.price,
            self.shipping_cost_covered,
            self.deadline,
        ) {
            (
                Some(user_id),
                Some(name),
                Some(description),
                Some(price),
                Some(shipping_cost_covered),
                Some(deadline),
            ) if errors.is_empty() => Ok(ValidItem {
                user_id,
                buyer_id: self.buyer_id,
                name: name.to_string(),
                description: description.to_string(),
                price,
                shipping_cost_covered,
                deadline,
                status: self.status,
            }),
            _ => Err(errors),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
// endregion: --- Candidate Item

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
    }

    fn valid_attributes() -> ItemAttributes {
        ItemAttributes {
            user_id: Some(1),
            buyer_id: None,
            name: Some("Desk lamp".to_string()),
            description: Some("Barely used".to_string()),
            price: Some(1500),
            shipping_cost_covered: Some(true),
            deadline: Some(now() + Duration::days(3)),
            status: ItemStatus::Listed,
            malformed: BTreeSet::new(),
        }
    }

    #[test]
    fn accepts_complete_attributes() {
        let valid = valid_attributes()
            .validate(ValidationContext::Default, now())
            .unwrap();
        assert_eq!(valid.name, "Desk lamp");
        assert_eq!(valid.status, ItemStatus::Listed);
    }

    #[test]
    fn rejects_non_positive_prices() {
        for price in [0, -1, -5000] {
            let attrs = ItemAttributes {
                price: Some(price),
                ..valid_attributes()
            };
            let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
            assert_eq!(errors.get("price"), [NOT_POSITIVE]);
        }
        for price in [1, 2, 999_999] {
            let attrs = ItemAttributes {
                price: Some(price),
                ..valid_attributes()
            };
            assert!(attrs.validate(ValidationContext::Default, now()).is_ok());
        }
    }

    #[test]
    fn rejects_missing_price_as_blank_and_not_a_number() {
        let attrs = ItemAttributes {
            price: None,
            ..valid_attributes()
        };
        let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
        assert_eq!(errors.get("price"), [BLANK, NOT_A_NUMBER]);
    }

    #[test]
    fn past_deadline_only_allowed_when_selecting_buyer() {
        let attrs = ItemAttributes {
            deadline: Some(now() - Duration::days(1)),
            ..valid_attributes()
        };
        let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
        assert_eq!(errors.get("deadline"), [EARLIER_THAN_TODAY]);

        assert!(attrs.validate(ValidationContext::SelectBuyer, now()).is_ok());
    }

    #[test]
    fn deadline_earlier_today_is_still_today() {
        let attrs = ItemAttributes {
            deadline: Some(Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap()),
            ..valid_attributes()
        };
        assert!(attrs.validate(ValidationContext::Default, now()).is_ok());

        let attrs = ItemAttributes {
            deadline: Some(Utc.with_ymd_and_hms(2024, 5, 16, 23, 59, 59).unwrap()),
            ..valid_attributes()
        };
        assert!(attrs.validate(ValidationContext::Default, now()).is_err());
    }

    #[test]
    fn missing_deadline_is_blank_in_every_context() {
        let attrs = ItemAttributes {
            deadline: None,
            ..valid_attributes()
        };
        let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
        assert_eq!(errors.get("deadline"), [BLANK, EARLIER_THAN_TODAY]);

        let errors = attrs
            .validate(ValidationContext::SelectBuyer, now())
            .unwrap_err();
        assert_eq!(errors.get("deadline"), [BLANK]);
    }

    #[test]
    fn shipping_cost_covered_must_be_explicit() {
        let attrs = ItemAttributes {
            shipping_cost_covered: None,
            ..valid_attributes()
        };
        let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
        assert_eq!(errors.get("shipping_cost_covered"), [NOT_INCLUDED]);

        for covered in [true, false] {
            let attrs = ItemAttributes {
                shipping_cost_covered: Some(covered),
                ..valid_attributes()
            };
            assert!(attrs.validate(ValidationContext::Default, now()).is_ok());
        }
    }

    #[test]
    fn collects_every_violation_at_once() {
        let attrs = ItemAttributes {
            user_id: None,
            name: Some("   ".to_string()),
            description: None,
            price: Some(0),
            shipping_cost_covered: None,
            deadline: Some(now() - Duration::days(2)),
            ..Default::default()
        };
        let errors = attrs.validate(ValidationContext::Default, now()).unwrap_err();
        for attribute in [
            "user",
            "name",
            "description",
            "price",
            "shipping_cost_covered",
            "deadline",
        ] {
            assert!(errors.contains(attribute), "missing error for {}", attribute);
        }
        assert!(errors
            .full_messages()
            .contains(&"deadline can't be earlier than today".to_string()));
    }

    #[test]
    fn merges_errors_collected_by_caller() {
        let mut seller_missing = ValidationErrors::new();
        seller_missing.add("user", MUST_EXIST);
        let errors = valid_attributes()
            .validate_with(ValidationContext::Default, now(), seller_missing)
            .unwrap_err();
        assert_eq!(errors.get("user"), [MUST_EXIST]);
    }

    #[test]
    fn changes_override_only_given_fields() {
        let attrs = valid_attributes().apply(ItemChanges {
            price: Some(2000.into()),
            ..Default::default()
        });
        assert_eq!(attrs.price, Some(2000));
        assert_eq!(attrs.name.as_deref(), Some("Desk lamp"));
    }

    #[test]
    fn mistyped_values_become_attribute_errors() {
        let changes: ItemChanges = serde_json::from_str(
            r#"{"name":"","description":"Oak","price":"abc","shipping_cost_covered":"yes","deadline":"someday"}"#,
        )
        .unwrap();
        let errors = ItemAttributes {
            user_id: Some(1),
            ..Default::default()
        }
        .apply(changes)
        .validate(ValidationContext::Default, now())
        .unwrap_err();

        assert_eq!(errors.get("name"), [BLANK]);
        assert_eq!(errors.get("price"), [NOT_A_NUMBER]);
        assert_eq!(errors.get("shipping_cost_covered"), [NOT_INCLUDED]);
        assert_eq!(errors.get("deadline"), [BLANK, EARLIER_THAN_TODAY]);
        assert!(!errors.contains("description"));
    }

    #[test]
    fn form_style_strings_are_coerced() {
        let changes: ItemChanges = serde_json::from_str(
            r#"{"price":" 2500 ","shipping_cost_covered":"0"}"#,
        )
        .unwrap();
        let attrs = valid_attributes().apply(changes);
        assert_eq!(attrs.price, Some(2500));
        assert_eq!(attrs.shipping_cost_covered, Some(false));
        assert!(attrs.validate(ValidationContext::Default, now()).is_ok());
    }

    #[test]
    fn valid_value_clears_earlier_malformed_input() {
        let attrs = valid_attributes()
            .apply(ItemChanges {
                price: Some(Input::Invalid(serde_json::json!([1, 2]))),
                ..Default::default()
            })
            .apply(ItemChanges {
                price: Some(300.into()),
                ..Default::default()
            });
        assert!(attrs.malformed.is_empty());
        assert!(attrs.validate(ValidationContext::Default, now()).is_ok());
    }
}
