//! Jobs service
//!
//! Job lifecycle: creation (with customer matching), wholesale edits,
//! status changes, deletion and photo attachments.
//!
//! Edits are deliberately permissive: `update_job` and `change_status`
//! re-run no validation and accept any status. `advance_status` is the
//! opt-in guard for forward-only progress.

use super::customer_matcher::{match_or_create, JobCustomerFields};
use crate::database::{
    generate_id, price_value, CreateJobRequest, Job, JobStatus, PaymentStatus, Photo, Repository,
};
use crate::error::{AppError, Result};
use std::collections::BTreeSet;

/// Service for managing jobs
#[derive(Clone)]
pub struct JobsService {
    repo: Repository,
}

impl JobsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a job and link it to a customer
    pub async fn create_job(&self, req: CreateJobRequest) -> Result<Job> {
        // Whitespace-only date or name counts as missing
        if req.date.trim().is_empty() {
            return Err(AppError::Validation("Job date is required".to_string()));
        }
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("Job name is required".to_string()));
        }

        tracing::info!("Creating job: {} on {}", req.name, req.date);

        let job = self
            .repo
            .mutate(|c, now| {
                let job = Job {
                    id: generate_id(),
                    date: req.date,
                    time: req.time,
                    name: req.name,
                    description: req.description,
                    customer_name: req.customer_name,
                    customer_phone: req.customer_phone,
                    customer_address: req.customer_address,
                    price: req.price,
                    notes: req.notes,
                    status: req.status.unwrap_or_default(),
                    payment_status: PaymentStatus::Pending,
                    invoice_id: None,
                    photos: Vec::new(),
                    created_at: now,
                    updated_at: None,
                };

                let fields = JobCustomerFields {
                    name: &job.customer_name,
                    phone: &job.customer_phone,
                    address: &job.customer_address,
                    price: price_value(&job.price),
                };
                if let Some(outcome) = match_or_create(&fields, &mut c.customers, now) {
                    tracing::debug!(
                        "Job {} linked to customer {} (new: {})",
                        job.id,
                        outcome.customer.id,
                        outcome.is_new
                    );
                }

                c.jobs.push(job.clone());
                Ok(job)
            })
            .await?;

        tracing::info!("Job created successfully: {}", job.id);

        Ok(job)
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: &str) -> Result<Job> {
        self.repo
            .read(|c| c.find_job(id).cloned())
            .await
            .ok_or_else(|| AppError::JobNotFound(id.to_string()))
    }

    /// List all jobs in creation order
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.repo.read(|c| c.jobs.clone()).await)
    }

    /// Replace a stored job wholesale.
    ///
    /// Customer counters are not adjusted, even if price or customer
    /// fields changed.
    pub async fn update_job(&self, job: Job) -> Result<Job> {
        tracing::debug!("Updating job: {}", job.id);

        let job = self.repo.mutate(|c, now| c.replace_job(job, now)).await?;

        tracing::debug!("Job updated successfully: {}", job.id);

        Ok(job)
    }

    /// Delete a job; its invoice, if any, is kept.
    ///
    /// Returns false when no job had that id.
    pub async fn delete_job(&self, id: &str) -> Result<bool> {
        tracing::info!("Deleting job: {}", id);

        let removed = self.repo.mutate(|c, _| Ok(c.remove_job(id))).await?;

        if removed {
            tracing::info!("Job deleted successfully: {}", id);
        } else {
            tracing::debug!("No job to delete: {}", id);
        }

        Ok(removed)
    }

    /// Set a job's status to any value
    pub async fn change_status(&self, id: &str, status: JobStatus) -> Result<Job> {
        tracing::info!("Changing status of job {} to {}", id, status);

        self.repo
            .mutate(|c, now| {
                let mut job = c
                    .find_job(id)
                    .cloned()
                    .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;
                job.status = status;
                c.replace_job(job, now)
            })
            .await
    }

    /// Move a job forward (scheduled -> in-progress -> completed) only
    pub async fn advance_status(&self, id: &str, status: JobStatus) -> Result<Job> {
        self.repo
            .mutate(|c, now| {
                let mut job = c
                    .find_job(id)
                    .cloned()
                    .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;

                if !job.status.can_advance_to(status) {
                    return Err(AppError::InvalidTransition {
                        from: job.status.to_string(),
                        to: status.to_string(),
                    });
                }

                tracing::info!("Advancing job {} from {} to {}", id, job.status, status);

                job.status = status;
                c.replace_job(job, now)
            })
            .await
    }

    /// Delete every job booked under a phone number
    pub async fn delete_by_customer_phone(&self, phone: &str) -> Result<usize> {
        let removed = self
            .repo
            .mutate(|c, _| Ok(c.remove_jobs_by_phone(phone)))
            .await?;

        tracing::info!("Deleted {} jobs for phone {}", removed, phone);

        Ok(removed)
    }

    /// Attach a photo record to a job
    pub async fn add_photo(&self, job_id: &str, uri: &str, file_name: Option<&str>) -> Result<Photo> {
        if uri.trim().is_empty() {
            return Err(AppError::Validation("Photo URI is required".to_string()));
        }

        let photo = self
            .repo
            .mutate(|c, now| {
                let mut job = c
                    .find_job(job_id)
                    .cloned()
                    .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;

                let photo = Photo {
                    id: generate_id(),
                    uri: uri.to_string(),
                    file_name: file_name
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("photo_{}.jpg", now.timestamp_millis())),
                    timestamp: now,
                };
                job.photos.push(photo.clone());
                c.replace_job(job, now)?;

                Ok(photo)
            })
            .await?;

        tracing::info!("Photo {} added to job {}", photo.id, job_id);

        Ok(photo)
    }

    /// Remove a photo record from a job, returning whether it existed
    pub async fn remove_photo(&self, job_id: &str, photo_id: &str) -> Result<bool> {
        self.repo
            .mutate(|c, now| {
                let mut job = c
                    .find_job(job_id)
                    .cloned()
                    .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;

                let before = job.photos.len();
                job.photos.retain(|p| p.id != photo_id);
                let removed = job.photos.len() < before;

                if removed {
                    c.replace_job(job, now)?;
                    tracing::info!("Photo {} removed from job {}", photo_id, job_id);
                }

                Ok(removed)
            })
            .await
    }

    /// Jobs booked on a date, ordered by time slot (unslotted last)
    pub async fn jobs_on_date(&self, date: &str) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .repo
            .read(|c| c.jobs.iter().filter(|j| j.date == date).cloned().collect())
            .await;

        jobs.sort_by(|a, b| {
            (a.time.is_empty(), &a.time).cmp(&(b.time.is_empty(), &b.time))
        });

        Ok(jobs)
    }

    /// Distinct dates that have at least one job, ascending
    pub async fn scheduled_dates(&self) -> Result<Vec<String>> {
        let dates: BTreeSet<String> = self
            .repo
            .read(|c| c.jobs.iter().map(|j| j.date.clone()).collect())
            .await;

        Ok(dates.into_iter().collect())
    }
}
