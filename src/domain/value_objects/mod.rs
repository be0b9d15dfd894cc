pub mod entity_type;
pub mod operation_type;
pub mod role;
pub mod shop_id;
pub mod sync_status;

pub use entity_type::EntityType;
pub use operation_type::{OperationStatus, OperationType};
pub use role::Role;
pub use shop_id::ShopId;
pub use sync_status::CloudSyncStatus;
