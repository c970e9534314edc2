mod documents;
mod password;
mod validation;

pub use documents::{
    format_cnpj, strip_non_digits, validate_cep, validate_cnpj, validate_cpf, validate_email,
    validate_password, PasswordCheck, PasswordStrength,
};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
