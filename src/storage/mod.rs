// storage/mod.rs
// Database operations module

pub mod domains;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod servers;
pub mod store;
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use domains::{
    insert_domain, list_domain_names, load_domain, touch_domain, update_domain,
};
pub use locks::DomainLocks;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use servers::{delete_server, insert_server, load_servers, update_server};
pub use store::DomainStore;
