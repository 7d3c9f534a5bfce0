pub mod handlers;
pub mod pkce;
pub mod supabase;

pub use supabase::{AuthError, SupabaseAuth};
