use crate::domain::commands::directory::{CreateDoctorCommand, LoginCommand, SignupPatientCommand};
use crate::domain::models::{Doctor as DomainDoctor, Patient as DomainPatient};
use shared::{
    CreateDoctorRequest, Doctor as SharedDoctor, LoginRequest, Patient as SharedPatient,
    PatientSignupRequest,
};

/// Mapper for doctor and patient profiles and the requests that create them.
pub struct DirectoryMapper;

impl DirectoryMapper {
    pub fn to_doctor_dto(domain: DomainDoctor) -> SharedDoctor {
        SharedDoctor {
            id: domain.id,
            username: domain.username,
            email: domain.email,
            specialty: domain.specialty,
        }
    }

    pub fn to_patient_dto(domain: DomainPatient) -> SharedPatient {
        SharedPatient {
            id: domain.id,
            username: domain.username,
            email: domain.email,
            birth_date: domain.birth_date.format("%Y-%m-%d").to_string(),
            phone_number: domain.phone_number,
        }
    }

    pub fn to_create_doctor_command(request: CreateDoctorRequest) -> CreateDoctorCommand {
        CreateDoctorCommand {
            username: request.username,
            email: request.email,
            password: request.password,
            specialty: request.specialty,
        }
    }

    pub fn to_signup_command(request: PatientSignupRequest) -> SignupPatientCommand {
        SignupPatientCommand {
            username: request.username,
            email: request.email,
            password: request.password,
            birth_date: request.birth_date,
            phone_number: request.phone_number,
        }
    }

    pub fn to_login_command(request: LoginRequest) -> LoginCommand {
        LoginCommand {
            username: request.username,
            password: request.password,
        }
    }
}
