use std::sync::Arc;
use std::time::Duration;

use super::{
    BytesFormatter, DurationFormatter, FormatterRegistry, PrimitiveFormatter, StringFormatter,
    UnitFormatter,
};
use crate::buffer::PooledBuffer;

macro_rules! primitives {
    ($registry:expr; $($ty:ty),+ $(,)?) => {
        $(
            $registry.register::<$ty, _>(PrimitiveFormatter::<$ty>::new());
            $registry.register_nullable::<$ty>();
        )+
    };
}

macro_rules! blittable_collections {
    ($registry:expr; $($ty:ty),+ $(,)?) => {
        $(
            $registry.register_blittable_collections::<$ty>();
        )+
    };
}

pub(super) fn register_all(registry: &FormatterRegistry) {
    primitives!(registry;
        u8, u16, u32, u64, u128, usize,
        i8, i16, i32, i64, i128, isize,
        f32, f64, bool, char,
    );
    blittable_collections!(registry;
        u8, u16, u32, u64, u128,
        i8, i16, i32, i64, i128,
        f32, f64,
    );
    registry.register_collection::<bool>();
    registry.register_collection::<char>();
    registry.register_collection::<String>();

    registry.register::<(), _>(UnitFormatter);
    registry.register::<String, _>(StringFormatter);
    registry.register::<Option<String>, _>(StringFormatter);
    registry.register::<Duration, _>(DurationFormatter);
    registry.register_nullable::<Duration>();
    registry.register::<Arc<[u8]>, _>(BytesFormatter);
    registry.register::<PooledBuffer, _>(BytesFormatter);
}
