//! A single interactive quiz card: a 3D panel that walks the user through a
//! list of yes/no questions, keeps a running score and persists progress.
//!
//! The crate owns the card's geometry, text placement, hit testing, press
//! feedback and quiz state. Drawing the resulting visuals is left to the
//! host so that everything here stays testable headless; the `quiz-card`
//! binary drives the card from the command line and the `web` module
//! exposes it to a browser page.

pub mod animation;
pub mod camera;
pub mod controller;
pub mod fetch;
pub mod geometry;
pub mod hit_test;
pub mod input;
pub mod layout;
pub mod question;
pub mod scene;
pub mod state;
pub mod store;
pub mod text;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::PressAnimator;
pub use camera::{Camera, CameraSettings};
pub use controller::{CardController, ClickOutcome, ResumePolicy};
pub use fetch::DEFAULT_QUESTION_HOST;
#[cfg(not(target_arch = "wasm32"))]
pub use fetch::{fetch_questions, QuestionFetcher};
pub use geometry::{ButtonRole, CardGeometry, CardGeometryBuilder, Mesh, VisualButton};
pub use hit_test::HitTester;
pub use input::{InputState, PointerEvent, PointerEventKind};
pub use layout::CardLayout;
pub use question::{Answer, Question, QuestionId, QuizSession, UserAnswer};
pub use scene::{Visual, VisualGroup, VisualKind};
pub use state::{CardDisplayState, CardError, CardState};
pub use store::{FileStore, KeyValueStore, MemoryStore, QuestionStore};
pub use text::{GlyphMetrics, MonospaceMetrics, TextField, TypefaceFont};
pub use viewport::{SharedViewport, StaticViewport, ViewportProvider};
