pub mod otp_codes;
