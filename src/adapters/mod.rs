pub mod amqp;
pub mod mock;
pub mod postgres;
pub mod redis;
