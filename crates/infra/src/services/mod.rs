mod dispatcher;
mod messenger;

pub use dispatcher::{
    HttpDispatcher, IDispatcher, InMemoryDispatcher, ScheduledTrigger, TriggerPayload,
};
pub use messenger::{
    ChannelError, HttpEmailMessenger, IMessenger, InMemoryMessenger, Messengers, OutboundMessage,
    SentMessage, TwilioSmsMessenger, TwilioVoiceMessenger,
};
