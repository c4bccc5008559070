/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, token rotation, sign-out, account deletion
/// - `users`: The caller's profile
/// - `resumes`: Résumé CRUD and the recruiter status workflow

pub mod auth;
pub mod health;
pub mod resumes;
pub mod users;
