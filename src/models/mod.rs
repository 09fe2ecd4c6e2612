mod notification_request;

pub use notification_request::{
    DEFAULT_BODY, DEFAULT_TITLE, NotificationRequest, ResolvedRequest, Target, Topic,
};
