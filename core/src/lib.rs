pub mod background;
pub mod contact;
pub mod element;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod keywords;
pub mod watch;

pub use background::{BackgroundEvent, BackgroundHooks, BackgroundParallax, BackgroundPhase};
pub use contact::{ContactError, ContactForm, ContactReply, MailSettings, OutgoingMail};
pub use element::{ElementParallax, ElementParallaxOptions, DEFAULT_SETTLE_FRAMES};
pub use geometry::{
    ElementRect, ImageSize, ViewportMetrics, DEFAULT_ELEMENT_MULTIPLIER, EASING_FACTOR,
    PARALLAX_MULTIPLIER, SNAP_THRESHOLD,
};
pub use host::{
    FrameId, FrameScheduler, ImageLoadError, ImageLoader, ParallaxHost, ParallaxSurface,
    Subscription, Viewport, ViewportEvent,
};
pub use keywords::{KeywordReveal, RevealSnapshot, RevealToken, SecretKeyword};
