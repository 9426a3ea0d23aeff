
mod http_adapter_test;
mod session_test;
mod verify_test;
