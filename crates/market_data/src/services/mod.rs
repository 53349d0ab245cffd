pub mod stream_service;
