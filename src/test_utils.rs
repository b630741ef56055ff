//! Shared proptest strategies for unit tests.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::SessionData;

/// Ids shaped like the ones `SessionData::new` mints.
pub(crate) fn arb_session_id() -> impl Strategy<Value = String> {
    "[0-9a-f]{32}"
}

/// Attribute maps without reserved bookkeeping keys.
pub(crate) fn arb_attributes() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z][a-z0-9_.]{0,15}", "\\PC{0,40}", 0..8)
}

/// Sessions with arbitrary ids, creation times and attributes.
pub(crate) fn arb_session_data() -> impl Strategy<Value = SessionData> {
    (arb_session_id(), 0i64..4_102_444_800_000, arb_attributes())
        .prop_map(|(id, created, attributes)| SessionData::restore(id, created, attributes))
}
