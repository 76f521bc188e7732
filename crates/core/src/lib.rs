pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_sampler;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_points;
        pub mod landmark_detector;
        pub mod landmark_extractor;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod detection;
        pub mod recording_controller;
        pub mod track_buffer;
        pub mod tracking_session;
    }
}

pub mod analysis {
    pub mod domain {
        pub mod median_filter;
        pub mod normalization;
        pub mod peak_finder;
        pub mod periodicity;
        pub mod track_statistics;
    }
}

pub mod export {
    pub mod domain {
        pub mod export_error;
        pub mod export_metadata;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod live_session_use_case;
    pub mod session_finalizer;
    pub mod track_video_use_case;
    pub mod tracking_config;
    pub mod tracking_logger;
}
