pub mod shared {
    pub mod config_error;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
    pub mod timestamp;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod motion {
    pub mod domain {
        pub mod gray_frame;
        pub mod motion_gate;
        pub mod motion_status;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod object_detector;
    }
    pub mod infrastructure;
}

pub mod alerting {
    pub mod domain {
        pub mod alert_dispatcher;
        pub mod alert_job;
        pub mod alert_message;
        pub mod alert_notifier;
        pub mod evidence_encoder;
        pub mod notification_transport;
        pub mod presence_machine;
    }
    pub mod infrastructure;
}

pub mod events {
    pub mod domain {
        pub mod event_boundary_logger;
        pub mod event_log;
        pub mod event_log_store;
        pub mod event_report;
    }
    pub mod infrastructure;
}

pub mod session {
    pub mod monitor_session;
    pub mod session_config;
    pub mod session_logger;
    pub mod settings;
}
