//! Renders stored preferences and orders into Slack message text.

use crate::domain::order::Order;
use crate::domain::preference::{DrinkPreference, ShopPreference};
use crate::domain::user::UserId;

pub const NO_DRINK_PREFERENCE: &str = "No preferences saved.";
pub const NO_SHOP_PREFERENCE: &str = "No coffee shop preferences saved.";
pub const NO_SHOPS_DELETED: &str = "No coffee shops found";
pub const NO_ORDERS: &str = "There are no orders!";

/// One user's answer to an order, joined with their current drink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderResponder {
    pub user_id: UserId,
    pub wants_coffee: bool,
    pub drink: Option<DrinkPreference>,
}

pub fn drink_preference_text(drink: Option<&DrinkPreference>) -> String {
    match drink.filter(|drink| drink.is_set()) {
        Some(drink) => format!(
            "Size: {}\nType: {}\nDetails: {}",
            drink.size, drink.drink_type, drink.details
        ),
        None => NO_DRINK_PREFERENCE.to_owned(),
    }
}

pub fn saved_drink_preference_text(drink: &DrinkPreference) -> String {
    format!("Saved preference:\n {}", drink_preference_text(Some(drink)))
}

pub fn shop_preference_text(shop: Option<&ShopPreference>) -> String {
    shop.map(ShopPreference::display_name).unwrap_or_else(|| NO_SHOP_PREFERENCE.to_owned())
}

pub fn saved_shop_preference_text(shop: &ShopPreference) -> String {
    format!("Saved coffee shop preference: {}", shop.display_name())
}

pub fn shop_deletion_text(deleted: u64) -> String {
    match deleted {
        0 => NO_SHOPS_DELETED.to_owned(),
        1 => "1 coffee shop deleted".to_owned(),
        count => format!("{count} coffee shops deleted"),
    }
}

/// One-line summary of what a user likes, phrased by which preferences exist.
pub fn user_summary(
    user_id: &UserId,
    drink: Option<&DrinkPreference>,
    shop: Option<&ShopPreference>,
) -> String {
    let mention = user_id.mention();
    match (drink.filter(|drink| drink.is_set()), shop) {
        (Some(drink), Some(shop)) => {
            format!("{mention} likes a {} from {}.", drink_phrase(drink), shop.display_name())
        }
        (Some(drink), None) => format!("{mention} likes a {}.", drink_phrase(drink)),
        (None, Some(shop)) => format!("{mention} prefers coffee from {}.", shop.display_name()),
        (None, None) => format!("{mention} has no preferences saved."),
    }
}

fn drink_phrase(drink: &DrinkPreference) -> String {
    let base = format!("{} {}", drink.size, drink.drink_type);
    if drink.details.trim().is_empty() {
        base
    } else {
        format!("{base} ({})", drink.details)
    }
}

pub fn shop_list_text(shops: &[ShopPreference]) -> String {
    if shops.is_empty() {
        return NO_SHOP_PREFERENCE.to_owned();
    }

    shops
        .iter()
        .map(|shop| format!("{}: {}", shop.user_id.mention(), shop.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_summary(order: &Order, responders: &[OrderResponder]) -> String {
    let mut output = format!("Coffee Order for {}\n\n", order.formatted_date());

    if responders.is_empty() {
        output.push_str("Nobody has responded to this order yet.");
        return output;
    }

    for responder in responders {
        output.push_str(&responder_line(responder));
        output.push('\n');
    }

    let getter = &order.coffee_getter;
    if responders.iter().any(|responder| &responder.user_id == getter) {
        output.push_str(&format!("\n{} is getting the coffee!\n", getter.mention()));
    }

    output
}

fn responder_line(responder: &OrderResponder) -> String {
    let mention = responder.user_id.mention();
    if !responder.wants_coffee {
        return format!("{mention} doesn't want anything.");
    }

    match responder.drink.as_ref().filter(|drink| drink.is_set()) {
        Some(drink) => {
            let order = format!("{} {} {}", drink.size, drink.drink_type, drink.details);
            format!("{mention}: {}", order.trim())
        }
        None => format!("{mention}: no drink preference saved"),
    }
}

pub fn order_history_text(orders: &[Order]) -> String {
    if orders.is_empty() {
        return NO_ORDERS.to_owned();
    }

    orders
        .iter()
        .map(|order| {
            format!(
                "#{} {}: {} got the coffee",
                order.id,
                order.formatted_date(),
                order.coffee_getter.mention()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Message posted to the channel when a coffee run starts.
pub fn order_announcement(coffee_getter: &UserId) -> String {
    format!(
        "Who wants coffee? {} is getting coffee, reply in this thread to get in on the order!",
        coffee_getter.mention()
    )
}

pub fn order_response_text(order: &Order, wants_coffee: bool) -> String {
    if wants_coffee {
        format!("You're in on coffee order #{}.", order.id)
    } else {
        format!("You're out of coffee order #{}.", order.id)
    }
}
