pub mod execution_service;
pub mod position_sizer;
pub mod signal_service;
pub mod telegram_service;

#[cfg(test)]
pub mod test_support;
