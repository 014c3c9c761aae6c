pub mod broadcast_publisher;
