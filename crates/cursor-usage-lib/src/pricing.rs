use std::collections::HashMap;

/// Price assumed for plans missing from the table.
pub const DEFAULT_SUBSCRIPTION_PRICE: f64 = 20.0;

pub struct PlanPricing {
    plan_prices: HashMap<String, f64>,
}

impl PlanPricing {
    pub fn new() -> Self {
        let mut plan_prices = HashMap::new();

        // Free really costs nothing. The browser extension's `price || 20`
        // lookup treated 0 as missing and billed Free as 20.
        plan_prices.insert("Free Plan".to_string(), 0.0);
        plan_prices.insert("Pro Plan".to_string(), 20.0);
        plan_prices.insert("Business Plan".to_string(), 40.0);
        plan_prices.insert("Pro+ Plan".to_string(), 60.0);
        plan_prices.insert("Ultra Plan".to_string(), 200.0);

        Self { plan_prices }
    }

    pub fn get_price(&self, plan: &str) -> Option<f64> {
        self.plan_prices.get(plan).copied()
    }

    pub fn subscription_price(&self, plan: Option<&str>) -> f64 {
        plan.and_then(|plan| self.get_price(plan))
            .unwrap_or(DEFAULT_SUBSCRIPTION_PRICE)
    }
}

impl Default for PlanPricing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_plans() {
        let pricing = PlanPricing::new();
        assert_eq!(pricing.subscription_price(Some("Pro Plan")), 20.0);
        assert_eq!(pricing.subscription_price(Some("Business Plan")), 40.0);
        assert_eq!(pricing.subscription_price(Some("Ultra Plan")), 200.0);
        assert_eq!(pricing.subscription_price(Some("Free Plan")), 0.0);
    }

    #[test]
    fn test_unknown_plan_defaults_to_twenty() {
        let pricing = PlanPricing::new();
        assert_eq!(pricing.subscription_price(Some("Enterprise")), 20.0);
        assert_eq!(pricing.subscription_price(None), 20.0);
        assert!(pricing.get_price("Enterprise").is_none());
    }
}
