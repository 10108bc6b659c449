// File: crates/booking_appointments/src/doc.rs

#![cfg(feature = "openapi")]
use crate::builder::{
    AnalyticsInput, AppointmentInput, BookingRequest, ClientInput, ConsentInput, ConsentsInput,
    DetailedBookingRequest, LocationInput, QuickBookingRequest,
};
use crate::handlers;
use crate::logic::{AppointmentUpdate, CreatedAppointment, SuggestedSlotsResponse};
use crate::suggestions::{DayPeriod, SuggestedSlot};
use booking_common::{Appointment, AppointmentStatus, Service};
use booking_notify::DispatchSummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_appointment_handler,
        handlers::list_appointments_handler,
        handlers::get_appointment_handler,
        handlers::update_appointment_handler,
        handlers::delete_appointment_handler,
        handlers::confirm_appointment_handler,
        handlers::cancel_appointment_handler,
        handlers::suggested_slots_handler,
        handlers::list_services_handler,
        handlers::get_service_handler,
        handlers::create_service_handler
    ),
    components(
        schemas(
            BookingRequest,
            QuickBookingRequest,
            DetailedBookingRequest,
            ClientInput,
            AppointmentInput,
            LocationInput,
            ConsentsInput,
            ConsentInput,
            AnalyticsInput,
            CreatedAppointment,
            DispatchSummary,
            AppointmentUpdate,
            Appointment,
            AppointmentStatus,
            Service,
            SuggestedSlotsResponse,
            SuggestedSlot,
            DayPeriod
        )
    ),
    tags(
        (name = "Appointments", description = "Booking, self-service links and slot suggestions"),
        (name = "Services", description = "Consulting service catalog")
    ),
    servers(
        (url = "/api", description = "Booking API server")
    )
)]
pub struct BookingApiDoc;
