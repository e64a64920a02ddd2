//! End-to-end parent/child walkthrough on a temporary store.

use attrorm_core::{
    Attributes, CacheKind, Entity, FactoryConfig, Item, LazyList, MappingError, Relations,
    SessionFactory,
};

use crate::commands::CliError;
use crate::formatter::Formatter;

#[derive(Debug, Clone)]
struct Order {
    id: String,
    customer: String,
    lines: LazyList<OrderLine>,
}

impl Entity for Order {
    const DOMAIN: &'static str = "Order";

    fn key(&self) -> &str {
        &self.id
    }

    fn to_attributes(&self) -> Attributes {
        Attributes::new().with("customer", &self.customer)
    }

    fn from_item(item: &Item, relations: &Relations) -> Result<Self, MappingError> {
        Ok(Order {
            id: item.key.clone(),
            customer: item.require("customer")?.to_string(),
            lines: relations.one_to_many::<OrderLine>("order", &item.key),
        })
    }
}

#[derive(Debug, Clone)]
struct OrderLine {
    id: String,
    order: String,
    quantity: u32,
}

impl Entity for OrderLine {
    const DOMAIN: &'static str = "OrderLine";

    fn key(&self) -> &str {
        &self.id
    }

    fn to_attributes(&self) -> Attributes {
        Attributes::new()
            .with("order", &self.order)
            .with("quantity", self.quantity.to_string())
    }

    fn from_item(item: &Item, _: &Relations) -> Result<Self, MappingError> {
        let raw = item.require("quantity")?;
        let quantity = raw.parse().map_err(|e: std::num::ParseIntError| {
            MappingError::InvalidAttribute {
                name: "quantity".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(OrderLine {
            id: item.key.clone(),
            order: item.require("order")?.to_string(),
            quantity,
        })
    }
}

/// Persist an order with three lines, drop one, add one, and report what
/// a fresh session sees.
pub fn run(cache: CacheKind, formatter: &dyn Formatter) -> Result<String, CliError> {
    let config = FactoryConfig::temporary()
        .with_unit("demo")
        .with_cache(cache)
        .with_print_queries(true);
    let factory = SessionFactory::builder(config)
        .register::<Order>()
        .register::<OrderLine>()
        .build()?;

    let mut session = factory.create_session()?;
    let mut order = Order {
        id: "o1".to_string(),
        customer: "acme".to_string(),
        lines: LazyList::new(),
    };
    for (i, quantity) in [3, 1, 4].into_iter().enumerate() {
        let line = OrderLine {
            id: format!("o1_{}", i + 1),
            order: order.id.clone(),
            quantity,
        };
        session.persist(&line)?;
        order.lines.push(line)?;
    }
    session.persist(&order)?;
    session.close();

    let mut session = factory.create_session()?;
    let Some(mut order) = session.find::<Order>("o1")? else {
        return Err(CliError::Usage("order o1 vanished".to_string()));
    };
    // Load the lines so the removal below has something to act on.
    order.lines.len()?;
    if let Some(dropped) = order.lines.remove("o1_2") {
        session.remove(&dropped)?;
    }
    let extra = OrderLine {
        id: "o1_4".to_string(),
        order: order.id.clone(),
        quantity: 5,
    };
    order.lines.push(extra.clone())?;
    session.persist(&extra)?;
    session.persist(&order)?;
    session.close();

    let session = factory.create_session()?;
    let reloaded = session
        .find::<Order>("o1")?
        .ok_or_else(|| CliError::Usage("order o1 vanished".to_string()))?;
    let total: u32 = reloaded.lines.iter()?.map(|line| line.quantity).sum();

    let rows: Vec<Item> = reloaded
        .lines
        .iter()?
        .map(|line| Item::new(&line.id, line.to_attributes()))
        .collect();
    let mut out = formatter.format_items(&factory.domain_name::<OrderLine>(), &rows);
    out.push('\n');
    out.push_str(&formatter.format_message(&format!(
        "order {} for {}: {} line(s), quantity {}, cache {}",
        reloaded.id,
        reloaded.customer,
        reloaded.lines.len()?,
        total,
        factory.cache().kind()
    )));

    factory.close()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::TableFormatter;

    #[test]
    fn test_demo_with_each_cache() {
        for kind in [CacheKind::PassThrough, CacheKind::Map] {
            let out = run(kind, &TableFormatter).unwrap();
            assert!(out.contains("o1_4"));
            assert!(!out.contains("o1_2"));
            assert!(out.contains("3 line(s), quantity 12"));
        }
    }
}
