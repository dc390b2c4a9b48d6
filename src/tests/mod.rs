
use std::sync::Arc;

use crate::{FormatterRegistry, Members, Result, Serializer, WireObject, Writer};

#[derive(Default, Debug, PartialEq, Clone)]
struct Order {
    id: u64,
    customer: String,
    lines: Vec<Line>,
    note: Option<String>,
}

#[derive(Default, Debug, PartialEq, Clone)]
struct Line {
    sku: u32,
    quantity: i16,
    price: f64,
}

impl WireObject for Order {
    const MEMBER_COUNT: usize = 4;

    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(&self.id)?;
        writer.write_value(&self.customer)?;
        writer.write_value(&self.lines)?;
        writer.write_value(&self.note)
    }

    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
        members.read(&mut self.id)?;
        members.read(&mut self.customer)?;
        members.read(&mut self.lines)?;
        members.read(&mut self.note)
    }
}

impl WireObject for Line {
    const MEMBER_COUNT: usize = 3;

    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(&self.sku)?;
        writer.write_value(&self.quantity)?;
        writer.write_value(&self.price)
    }

    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
        members.read(&mut self.sku)?;
        members.read(&mut self.quantity)?;
        members.read(&mut self.price)
    }
}

fn order_serializer() -> Serializer {
    let registry = FormatterRegistry::with_builtins();
    registry.register_object::<Order>();
    registry.register_object::<Line>();
    registry.register_collection::<Line>();
    registry.register_collection::<Order>();
    Serializer::new().with_registry(Arc::new(registry))
}

fn sample_order(lines: usize) -> Order {
    Order {
        id: 0xDEAD_BEEF,
        customer: "Zoë Ångström".to_string(),
        lines: (0..lines)
            .map(|i| Line {
                sku: i as u32,
                quantity: -(i as i16),
                price: i as f64 * 0.25,
            })
            .collect(),
        note: (lines % 2 == 0).then(|| "leave at door".to_string()),
    }
}
