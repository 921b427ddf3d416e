mod counter;
mod jwt;
mod manager;
mod middleware;
mod pin;
mod register;
mod types;

pub use counter::{CounterStore, MemoryCounterStore};
pub use jwt::{JwtService, TokenIssuer};
pub use manager::CredentialGate;
pub use middleware::AuthMiddleware;
pub use pin::PinHasher;
pub use register::Registrar;
pub use types::{Claims, TokenPair};
