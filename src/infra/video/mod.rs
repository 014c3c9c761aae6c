pub mod http_video_provider;
