//! Typed ID definitions.

use crate::define_id;

define_id!(EventId, "evt");
define_id!(RequestId, "req");
