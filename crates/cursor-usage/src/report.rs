//! Plain-text and JSON renderings of a usage report.

use cursor_usage_monitor::{TimeRange, UsageReport};
use serde_json::{json, Value};

pub const NO_DATA_MESSAGE: &str =
    "No usage data stored yet. Open cursor.com/dashboard and run `cursor-usage scrape`.";

/// Number of recent events listed before collapsing the rest.
pub const RECENT_EVENTS: usize = 12;

/// 1234567 -> "1,234,567"
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn window_label(range: TimeRange) -> String {
    match range {
        TimeRange::CurrentPeriod => "billing period".to_string(),
        TimeRange::Days(days) => format!("{} days", days),
        TimeRange::All => "stored history".to_string(),
    }
}

pub fn to_text(report: &UsageReport) -> String {
    let view = report.view();
    let billing = report.billing();
    let averages = report.averages();
    let subscription = report.subscription();

    let mut lines = Vec::new();

    lines.push(format!("Cursor Usage: {}", report.time_range().label()));
    lines.push(format!("  Range:            {}", report.range_span()));
    if let Some(updated) = report.last_updated() {
        lines.push(format!("  Last updated:     {}", updated.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.push(format!("  Events in range:  {}", view.event_count()));
    lines.push(String::new());

    lines.push("Billing Period".to_string());
    lines.push(format!("  Current period:   {}", billing.formatted()));
    lines.push(format!(
        "  Days elapsed:     {} of {}",
        billing.days_elapsed(),
        billing.total_days()
    ));
    lines.push(format!("  Days remaining:   {}", billing.days_remaining()));
    lines.push(format!(
        "  Next billing:     {}",
        billing.next_billing_date().format("%B %-d, %Y")
    ));
    lines.push(format!(
        "  Progress:         {}% through {}",
        billing.progress_percentage(),
        billing.month_label()
    ));
    lines.push(String::new());

    if let Some(plan) = view.plan() {
        lines.push(format!("Subscription ({})", plan));
        lines.push(format!("  Price:            ${}", subscription.subscription_price()));
        lines.push(format!(
            "  Used:             ${:.2} ({})",
            view.total_cost(),
            report.time_range().short_label()
        ));
        lines.push(format!("  Remaining budget: ${:.2}", subscription.remaining_budget()));
        lines.push(format!("  Usage:            {}%", subscription.usage_percentage()));
        if let Some(on_demand) = view.on_demand_usage() {
            lines.push(format!("  On-demand usage:  {}", on_demand.as_str()));
        }
        lines.push(String::new());
    }

    if !view.costs().is_empty() {
        lines.push("Cost Analysis".to_string());
        lines.push(format!("  Price/token:      ${:.6}", subscription.price_per_token()));
        lines.push(format!("  Avg/day:          ${:.3}", averages.avg_cost_per_day()));
        lines.push(format!("  Total requests:   {}", view.costs().len()));
        if let Some(avg) = view.average_cost_per_request() {
            lines.push(format!("  Avg cost/request: ${:.4}", avg));
        }
        if let Some(max) = view.most_expensive_request() {
            lines.push(format!("  Most expensive:   ${:.3}", max));
        }
        lines.push(format!(
            "  Projected month:  ${:.2}",
            averages.projected_monthly_cost()
        ));
        if let Some(excess) = subscription.projected_overage(averages) {
            lines.push(format!(
                "  Warning: projected cost exceeds subscription by ${:.2}",
                excess
            ));
        }
        lines.push(String::new());
    }

    if !view.tokens().is_empty() {
        lines.push("Token Metrics".to_string());
        lines.push(format!(
            "  Total tokens:     {:.2}M",
            view.total_tokens() as f64 / 1_000_000.0
        ));
        lines.push(format!(
            "  Avg/day:          {:.0}K",
            averages.avg_tokens_per_day() / 1_000.0
        ));
        lines.push(format!("  Token events:     {}", view.tokens().len()));
        if let Some(avg) = view.average_tokens_per_request() {
            lines.push(format!("  Avg tokens/req:   {}", format_count(avg)));
        }
        if let Some(max) = view.largest_request() {
            lines.push(format!("  Largest request:  {} tokens", format_count(max)));
        }
        lines.push(format!(
            "  Efficiency:       {} tokens/$",
            format_count(subscription.tokens_per_dollar())
        ));
        lines.push(String::new());
    }

    if !view.is_empty() {
        lines.push(format!("Activity ({})", report.time_range().label()));
        lines.push(format!("  Total events:     {}", view.event_count()));
        lines.push(format!("  Today's events:   {}", view.today_events()));
        lines.push(format!("  Avg events/day:   {:.1}", averages.avg_events_per_day()));
        lines.push(format!("  Error rate:       {:.1}%", view.error_rate()));
        lines.push(format!("  Date range:       {}", view.date_range()));
        if view.fallback_dated_events() > 0 {
            lines.push(format!(
                "  Undated events:   {} (counted as today)",
                view.fallback_dated_events()
            ));
        }
        for event in view.usage_events().iter().take(RECENT_EVENTS) {
            lines.push(format!(
                "    {} tokens - {}  {} • {}",
                event.tokens_text(),
                event.cost_text(),
                event.date(),
                event.model()
            ));
        }
        if view.event_count() > RECENT_EVENTS {
            lines.push(format!(
                "    ...and {} more events",
                view.event_count() - RECENT_EVENTS
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Loaded {} cost entries and {} token entries from the last {}.",
        view.costs().len(),
        view.tokens().len(),
        window_label(report.time_range())
    ));

    lines.push(String::new());
    lines.join("\n")
}

pub fn to_json(report: &UsageReport) -> Value {
    let view = report.view();
    let billing = report.billing();
    let averages = report.averages();
    let subscription = report.subscription();

    let daily: Vec<Value> = view
        .events_by_date()
        .iter()
        .map(|(date, activity)| {
            json!({
                "date": date.to_string(),
                "events": activity.events(),
                "cost": activity.cost(),
                "tokens": activity.tokens(),
            })
        })
        .collect();

    json!({
        "timeRange": report.time_range().to_string(),
        "rangeSpan": report.range_span(),
        "lastUpdated": report.last_updated().map(|t| t.to_rfc3339()),
        "plan": view.plan(),
        "onDemandUsage": view.on_demand_usage().map(|u| u.as_str()),
        "events": view.event_count(),
        "todayEvents": view.today_events(),
        "errorEvents": view.error_events(),
        "errorRate": view.error_rate(),
        "fallbackDatedEvents": view.fallback_dated_events(),
        "totalCost": view.total_cost(),
        "totalTokens": view.total_tokens(),
        "dateRange": view.date_range(),
        "daily": daily,
        "billingPeriod": {
            "start": billing.start().to_string(),
            "end": billing.end().to_string(),
            "nextBilling": billing.next_billing_date().to_string(),
            "totalDays": billing.total_days(),
            "daysElapsed": billing.days_elapsed(),
            "daysRemaining": billing.days_remaining(),
            "progressPercentage": billing.progress_percentage(),
        },
        "averages": {
            "windowDays": averages.window_days(),
            "costPerDay": averages.avg_cost_per_day(),
            "tokensPerDay": averages.avg_tokens_per_day(),
            "eventsPerDay": averages.avg_events_per_day(),
            "projectedMonthlyCost": averages.projected_monthly_cost(),
            "projectedMonthlyTokens": averages.projected_monthly_tokens(),
        },
        "subscription": {
            "price": subscription.subscription_price(),
            "remainingBudget": subscription.remaining_budget(),
            "usagePercentage": subscription.usage_percentage(),
            "pricePerToken": subscription.price_per_token(),
            "tokensPerDollar": subscription.tokens_per_dollar(),
            "projectedOverage": subscription.projected_overage(averages),
        },
    })
}
