use std::process::Child;

/// RAII wrapper for a Windows Job Object handle
///
/// Closing the handle terminates every process in the job
/// (`JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE`). The OS closes it when this process
/// dies, whatever the cause.
pub(crate) struct JobObjectHandle {
    handle: windows::Win32::Foundation::HANDLE,
}

// SAFETY: a job HANDLE is an opaque kernel object reference usable from any thread.
unsafe impl Send for JobObjectHandle {}

impl Drop for JobObjectHandle {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

pub(crate) fn create_job_object() -> Result<JobObjectHandle, String> {
    use windows::Win32::System::JobObjects::{
        CreateJobObjectW, JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE, JOBOBJECT_EXTENDED_LIMIT_INFORMATION,
        JobObjectExtendedLimitInformation, SetInformationJobObject,
    };

    unsafe {
        let job = CreateJobObjectW(None, None)
            .map_err(|e| format!("Failed to create Job Object: {e}"))?;
        let handle = JobObjectHandle { handle: job };

        let mut info: JOBOBJECT_EXTENDED_LIMIT_INFORMATION = std::mem::zeroed();
        info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;

        SetInformationJobObject(
            handle.handle,
            JobObjectExtendedLimitInformation,
            (&raw const info).cast(),
            std::mem::size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32,
        )
        .map_err(|e| format!("Failed to configure Job Object: {e}"))?;

        Ok(handle)
    }
}

pub(crate) fn assign_to_job(job: &JobObjectHandle, child: &Child) -> Result<(), String> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::JobObjects::AssignProcessToJobObject;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_SET_QUOTA, PROCESS_TERMINATE};

    unsafe {
        let process_handle = OpenProcess(PROCESS_SET_QUOTA | PROCESS_TERMINATE, false, child.id())
            .map_err(|e| format!("Failed to open process for job assignment: {e}"))?;

        let assigned = AssignProcessToJobObject(job.handle, process_handle);
        let _ = CloseHandle(process_handle);
        assigned.map_err(|e| format!("Failed to assign process to Job Object: {e}"))
    }
}

pub(crate) fn terminate(pid: u32) {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

    unsafe {
        if let Ok(handle) = OpenProcess(PROCESS_TERMINATE, false, pid) {
            let _ = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);
        }
    }
}
