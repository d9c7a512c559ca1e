//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::dialog::{
    handle_turn, ReplyKind, INVALID_QUANTITY_REPLY, MAXIMUM_EXCEEDED_REPLY,
    UNRECOGNIZED_ITEM_REPLY,
};
use super::*;
use crate::menu::{MenuCatalog, MenuItem};
use crate::quantity::MAX_PLATES;
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_menu_item() -> impl Strategy<Value = MenuItem> {
    let items = MenuCatalog::cafe_cammi().items().to_vec();
    proptest::sample::select(items)
}

fn arb_selected_state() -> impl Strategy<Value = OrderState> {
    (arb_menu_item(), 0..=MAX_PLATES).prop_map(|(item, quantity)| {
        OrderState::AwaitingQuantity {
            item: item.label,
            unit_price: item.unit_price,
            quantity,
        }
    })
}

fn arb_state() -> impl Strategy<Value = OrderState> {
    prop_oneof![Just(OrderState::AwaitingItem), arb_selected_state()]
}

/// Text that is never a catalog label
fn arb_unknown_label() -> impl Strategy<Value = String> {
    ".{0,30}".prop_filter("must not be a menu label", |s| {
        MenuCatalog::cafe_cammi().lookup(s).is_none()
    })
}

/// Text that never parses as an integer
fn arb_non_numeric() -> impl Strategy<Value = String> {
    "[a-zA-Z +.]{0,20}".prop_filter("must not parse", |s| s.parse::<i32>().is_err())
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::ConversationStarted),
        arb_menu_item().prop_map(|item| Event::user_message(item.label)),
        (-5i32..10).prop_map(|q| Event::user_message(q.to_string())),
        "[a-zA-Z +]{0,15}".prop_map(Event::user_message),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &OrderState, menu: &MenuCatalog) -> bool {
    match state {
        OrderState::AwaitingItem => true,
        OrderState::AwaitingQuantity {
            item,
            unit_price,
            quantity,
        } => {
            *unit_price > Decimal::ZERO
                && *quantity <= MAX_PLATES
                && menu.lookup(item).map(|m| m.unit_price) == Some(*unit_price)
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Catalog hits select the item at its price
    #[test]
    fn prop_known_item_selected(item in arb_menu_item()) {
        let out = handle_turn(&OrderState::AwaitingItem, &item.label, &MenuCatalog::cafe_cammi());

        prop_assert_eq!(out.state.selected_item(), Some(item.label.as_str()));
        prop_assert_eq!(out.state.unit_price(), item.unit_price);
        prop_assert!(out.reply.text.contains(&item.prompt_fragment));
    }

    // Anything else is rejected without touching the order
    #[test]
    fn prop_unknown_item_rejected(text in arb_unknown_label()) {
        let out = handle_turn(&OrderState::AwaitingItem, &text, &MenuCatalog::cafe_cammi());

        prop_assert_eq!(out.state, OrderState::AwaitingItem);
        prop_assert_eq!(out.reply.text, UNRECOGNIZED_ITEM_REPLY);
    }

    // Valid quantities set the quantity and announce the total
    #[test]
    fn prop_valid_quantity_announces_total(state in arb_selected_state(), q in 1..=MAX_PLATES) {
        let out = handle_turn(&state, &q.to_string(), &MenuCatalog::cafe_cammi());
        let expected = state.unit_price() * Decimal::from(q);

        prop_assert_eq!(out.state.quantity(), q);
        prop_assert_eq!(out.state.selected_item(), state.selected_item());
        prop_assert_eq!(out.reply.text, format!("Your total amount is: Ksh {expected}"));
    }

    #[test]
    fn prop_too_many_plates_rejected(state in arb_selected_state(), q in (MAX_PLATES + 1)..100_000) {
        let out = handle_turn(&state, &q.to_string(), &MenuCatalog::cafe_cammi());

        prop_assert_eq!(out.state, state);
        prop_assert_eq!(out.reply.text, MAXIMUM_EXCEEDED_REPLY);
    }

    #[test]
    fn prop_non_numeric_quantity_rejected(state in arb_selected_state(), text in arb_non_numeric()) {
        let out = handle_turn(&state, &text, &MenuCatalog::cafe_cammi());

        prop_assert_eq!(out.state, state);
        prop_assert_eq!(out.kind, ReplyKind::QuantityNotANumber);
        prop_assert_eq!(out.reply.text, INVALID_QUANTITY_REPLY);
    }

    // Repeating rejected input any number of times never mutates state
    #[test]
    fn prop_rejections_are_idempotent(
        state in arb_state(),
        text in arb_non_numeric(),
        repeats in 1usize..10
    ) {
        let menu = MenuCatalog::cafe_cammi();
        prop_assume!(menu.lookup(&text).is_none());

        let mut current = state.clone();
        for _ in 0..repeats {
            current = transition(&current, &menu, Event::user_message(text.clone())).new_state;
        }
        prop_assert_eq!(current, state);
    }

    // Any event sequence keeps the order valid
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..20)) {
        let menu = MenuCatalog::cafe_cammi();
        let mut state = OrderState::default();

        for event in events {
            state = transition(&state, &menu, event).new_state;
            prop_assert!(is_valid_state(&state, &menu), "Invalid state: {:?}", state);
        }
    }

    // PersistState appears exactly when the state changed, before any reply
    #[test]
    fn prop_state_changes_persist(state in arb_state(), event in arb_event()) {
        let menu = MenuCatalog::cafe_cammi();
        let result = transition(&state, &menu, event);

        let persist_at = result.effects.iter().position(|e| matches!(e, Effect::PersistState));
        prop_assert_eq!(persist_at.is_some(), result.new_state != state);

        if let Some(idx) = persist_at {
            let first_reply = result
                .effects
                .iter()
                .position(|e| matches!(e, Effect::SendReply { .. }));
            prop_assert!(first_reply.is_some_and(|r| r > idx));
        }
    }

    // Every user message gets exactly one reply
    #[test]
    fn prop_one_reply_per_message(state in arb_state(), text in ".{0,20}") {
        let result = transition(&state, &MenuCatalog::cafe_cammi(), Event::user_message(text));
        let replies = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::SendReply { .. }))
            .count();
        prop_assert_eq!(replies, 1);
    }
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

fn replies(result: &TransitionResult) -> Vec<&str> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::SendReply { reply } => Some(reply.text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_scenario_ugali_two_plates() {
    let menu = MenuCatalog::cafe_cammi();

    let start = transition(&OrderState::default(), &menu, Event::ConversationStarted);
    assert_eq!(start.effects.len(), 2);

    let r = transition(&start.new_state, &menu, Event::user_message("Ugali + Beef"));
    assert_eq!(replies(&r), vec!["How many plates of Ugali Beef"]);
    assert_eq!(r.new_state.selected_item(), Some("Ugali + Beef"));
    assert_eq!(r.new_state.unit_price(), Decimal::new(300, 0));

    let r = transition(&r.new_state, &menu, Event::user_message("2"));
    assert_eq!(replies(&r), vec!["Your total amount is: Ksh 600.0"]);
    assert_eq!(r.new_state.quantity(), 2);
}

#[test]
fn test_scenario_unknown_then_known() {
    let menu = MenuCatalog::cafe_cammi();

    let r = transition(&OrderState::default(), &menu, Event::user_message("Pizza"));
    assert_eq!(replies(&r), vec![UNRECOGNIZED_ITEM_REPLY]);
    assert_eq!(r.new_state, OrderState::AwaitingItem);

    let r = transition(&r.new_state, &menu, Event::user_message("Rice + Beans"));
    assert_eq!(r.new_state.selected_item(), Some("Rice + Beans"));
    assert_eq!(r.new_state.unit_price(), Decimal::new(200, 0));
}

#[test]
fn test_scenario_too_many_then_garbage() {
    let menu = MenuCatalog::cafe_cammi();
    let selected = transition(&OrderState::default(), &menu, Event::user_message("Rice + Beef")).new_state;

    let r = transition(&selected, &menu, Event::user_message("5"));
    assert_eq!(replies(&r), vec![MAXIMUM_EXCEEDED_REPLY]);
    assert_eq!(r.new_state.quantity(), 0);

    let r = transition(&r.new_state, &menu, Event::user_message("abc"));
    assert_eq!(replies(&r), vec![INVALID_QUANTITY_REPLY]);
    assert_eq!(r.new_state.quantity(), 0);
}
