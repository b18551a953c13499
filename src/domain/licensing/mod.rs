//! Licensing domain - License records, their state machine, and the
//! pluggable license kinds that grant and revoke real privileges.

mod aggregate;
mod errors;
mod events;
mod expiration;
mod factory;
mod fields;
mod license_type;
mod state;

pub use aggregate::{License, LicenseContext, LicenseRecord, TransitionOutcome};
pub use errors::LicenseError;
pub use events::LicenseEvent;
pub use expiration::{
    ExpirationPolicy, ExpirationPolicyRef, Expiry, PeriodUnit, RecurringPeriod,
    RecurringPeriodPolicy, UNLIMITED,
};
pub use factory::LicenseFactory;
pub use fields::{FieldKind, FieldSchema, FieldSpec, FieldValue, LicenseFields};
pub use license_type::{
    ConfiguredLicenseType, ExistingRights, LicenseTypeDescriptor, LicenseTypeRegistry,
    LicenseTypeStrategy, RoleLicenseType, ROLE_FIELD,
};
pub use state::{LicenseState, LicenseTransition, SideEffect};
