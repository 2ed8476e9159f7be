//! HTML bodies for order emails, themed per status.

use crate::domain::currency::{self, Currency};
use crate::domain::order::{Order, OrderStatus};

struct Theme {
    gradient: &'static str,
    badge: &'static str,
    title: &'static str,
    accent: &'static str,
    message: String,
}

fn theme(order: &Order, status: OrderStatus) -> Theme {
    let first_name = order.customer.first_name().to_string();
    match status {
        OrderStatus::Shipped => Theme {
            gradient: "linear-gradient(135deg, #7000ff 0%, #ff00ea 100%)",
            badge: "On Its Way",
            title: "GEAR SHIPPED",
            accent: "#ff00ea",
            message: "Your package is now in transit. Get ready to level up!".into(),
        },
        OrderStatus::Delivered => Theme {
            gradient: "linear-gradient(135deg, #0cebeb 0%, #20e3b2 50%, #29ffc6 100%)",
            badge: "Mission Complete",
            title: "DELIVERED",
            accent: "#20e3b2",
            message: "Package received! We hope you love your new tech.".into(),
        },
        OrderStatus::Cancelled => Theme {
            gradient: "linear-gradient(135deg, #333333 0%, #000000 100%)",
            badge: "Order Cancelled",
            title: "CLOSED",
            accent: "#64748b",
            message: "Your order has been cancelled and a refund (if applicable) has been initiated."
                .into(),
        },
        OrderStatus::CancelledByCustomer => Theme {
            gradient: "linear-gradient(135deg, #333333 0%, #000000 100%)",
            badge: "Cancelled by You",
            title: "CLOSED",
            accent: "#64748b",
            message: format!(
                "As requested, your order has been cancelled. We're sorry it didn't work out this time, {first_name}!"
            ),
        },
        // Pending/processing rarely mail, but keep a sane default theme.
        _ => Theme {
            gradient: "linear-gradient(135deg, #00f2ff 0%, #0066ff 100%)",
            badge: "Preparing Gear",
            title: "IN PRODUCTION",
            accent: "#00f2ff",
            message: format!(
                "Great news, {first_name}! We're currently preparing your items for shipment."
            ),
        },
    }
}

fn money(order: &Order, amount: rust_decimal::Decimal) -> String {
    let cur: Currency = order.currency.parse().unwrap_or_default();
    currency::format_with_rate(amount, cur, order.exchange_rate)
}

fn item_rows(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|item| {
            let image = item
                .image
                .as_deref()
                .unwrap_or(crate::domain::product::PLACEHOLDER_IMAGE);
            format!(
                concat!(
                    r#"<tr style="border-bottom:1px solid rgba(255,255,255,0.05);">"#,
                    r#"<td style="padding:15px 0;width:64px;"><img src="{image}" alt="{name}" "#,
                    r#"style="width:56px;height:56px;object-fit:cover;border-radius:12px;"></td>"#,
                    r#"<td style="padding:15px;text-align:left;color:#ffffff;">{name}"#,
                    r#"<div style="color:#94a3b8;font-size:11px;">Qty: {qty} &bull; {unit}</div></td>"#,
                    r#"<td style="padding:15px 0;text-align:right;color:#00f2ff;">{line_total}</td>"#,
                    "</tr>"
                ),
                image = image,
                name = item.name,
                qty = item.quantity,
                unit = money(order, item.price),
                line_total = money(order, item.subtotal()),
            )
        })
        .collect()
}

fn shell(hero: String, body: String) -> String {
    format!(
        concat!(
            r#"<div style="margin:0;padding:0;width:100%;background-color:#050505;font-family:'Inter',-apple-system,sans-serif;">"#,
            r#"<table border="0" cellpadding="0" cellspacing="0" width="100%" "#,
            r#"style="max-width:480px;margin:30px auto;background-color:#0d1117;border-radius:32px;overflow:hidden;">"#,
            "{hero}{body}",
            r#"<tr><td align="center" style="background-color:#050505;padding:30px;color:#4c566a;font-size:10px;">"#,
            "NeonMarket Hub &bull; Automated Manifest &bull; Verified Secure",
            "</td></tr></table></div>"
        ),
        hero = hero,
        body = body,
    )
}

fn hero(gradient: &str, badge: &str, title: &str, message: &str) -> String {
    format!(
        concat!(
            r#"<tr><td align="center" style="background:{gradient};padding:45px 30px;">"#,
            r#"<span style="font-size:10px;font-weight:900;color:#ffffff;text-transform:uppercase;letter-spacing:2px;">{badge}</span>"#,
            r#"<h1 style="margin:12px 0 0;font-size:32px;color:#ffffff;text-transform:uppercase;letter-spacing:6px;">{title}</h1>"#,
            r#"<p style="margin:12px 0 0;font-size:13px;color:rgba(255,255,255,0.8);">{message}</p>"#,
            "</td></tr>"
        ),
        gradient = gradient,
        badge = badge,
        title = title,
        message = message,
    )
}

fn summary_card(accent: &str, order: &Order) -> String {
    format!(
        concat!(
            r#"<tr><td style="padding:30px;">"#,
            r#"<table width="100%" style="background:rgba(255,255,255,0.03);border-radius:20px;margin-bottom:30px;"><tr>"#,
            r#"<td style="padding:20px;width:50%;color:#505c76;font-size:10px;">REF NUMBER<br>"#,
            r#"<span style="font-size:14px;font-weight:900;color:{accent};font-family:monospace;">#{display_id}</span></td>"#,
            r#"<td style="padding:20px;width:50%;color:#505c76;font-size:10px;">TOTAL<br>"#,
            r#"<span style="font-size:16px;font-weight:900;color:#ffffff;">{total}</span></td>"#,
            "</tr></table>",
            r#"<table width="100%" style="border-collapse:collapse;">{rows}</table>"#,
            "</td></tr>"
        ),
        accent = accent,
        display_id = order.display_id,
        total = money(order, order.total),
        rows = item_rows(order),
    )
}

/// Receipt sent right after checkout.
pub(crate) fn confirmation_html(order: &Order) -> String {
    let greeting = format!(
        "Thanks for your gear, {}!",
        order.customer.first_name()
    );
    shell(
        hero(
            "linear-gradient(135deg, #00f2ff 0%, #7000ff 100%)",
            "Order Confirmed",
            "NEON MARKET",
            &greeting,
        ),
        summary_card("#00f2ff", order),
    )
}

/// Lifecycle email for an interesting status transition.
pub(crate) fn status_html(order: &Order, status: OrderStatus) -> String {
    let t = theme(order, status);
    shell(
        hero(t.gradient, t.badge, t.title, &t.message),
        summary_card(t.accent, order),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::order;

    #[test]
    fn confirmation_carries_order_details() {
        let o = order("10000042");
        let html = confirmation_html(&o);
        assert!(html.contains("#10000042"));
        assert!(html.contains("Cyberpunk Headphones"));
        assert!(html.contains("$199.99"));
        assert!(html.contains("Thanks for your gear, Alex!"));
    }

    #[test]
    fn statuses_get_distinct_themes() {
        let o = order("10000043");
        let shipped = status_html(&o, OrderStatus::Shipped);
        let delivered = status_html(&o, OrderStatus::Delivered);
        let cancelled = status_html(&o, OrderStatus::Cancelled);

        assert!(shipped.contains("GEAR SHIPPED"));
        assert!(shipped.contains("#ff00ea"));
        assert!(delivered.contains("DELIVERED"));
        assert!(delivered.contains("#20e3b2"));
        assert!(cancelled.contains("CLOSED"));
    }

    #[test]
    fn customer_cancellation_reads_differently_from_admin_cancellation() {
        let o = order("10000044");
        let by_admin = status_html(&o, OrderStatus::Cancelled);
        let by_customer = status_html(&o, OrderStatus::CancelledByCustomer);
        assert!(by_admin.contains("refund"));
        assert!(by_customer.contains("As requested"));
    }

    #[test]
    fn totals_respect_the_order_currency_snapshot() {
        let mut o = order("10000045");
        o.currency = "PKR".into();
        o.exchange_rate = rust_decimal::Decimal::new(27850, 2);
        let html = confirmation_html(&o);
        assert!(html.contains("Rs "));
    }
}
