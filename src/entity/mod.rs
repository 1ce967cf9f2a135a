pub mod audit_logs;
pub mod books;
pub mod categories;
pub mod favorites;
pub mod order_details;
pub mod orders;
pub mod sea_orm_active_enums;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use books::Entity as Books;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use order_details::Entity as OrderDetails;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
