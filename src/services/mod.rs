//! Services
//!
//! 외부 문장 생성 호출과 세션 compose 워크플로우

pub mod composer;
pub mod translation;

pub use composer::{ComposerDefaults, SentenceComposer, TextComposer};
pub use translation::TranslationSessionManager;
